//! Wallet stand-in for the terminal: an address the player typed in.

use std::sync::Mutex;

use academy_core::{WalletAddress, WalletConnector};

#[derive(Debug, Default)]
pub struct CliWallet {
    address: Mutex<Option<WalletAddress>>,
}

impl CliWallet {
    pub fn new(address: Option<WalletAddress>) -> Self {
        Self {
            address: Mutex::new(address),
        }
    }

    pub fn connect(&self, address: WalletAddress) {
        *self.address.lock().unwrap_or_else(|e| e.into_inner()) = Some(address);
    }
}

impl WalletConnector for CliWallet {
    fn address(&self) -> Option<WalletAddress> {
        self.address.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn request_connection(&self) {
        println!("No wallet connected. Use `connect <0x address>` first.");
    }
}
