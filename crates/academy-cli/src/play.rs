//! Interactive play loop: one command per line on stdin.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use academy_core::{
    AcademyError, AcademySession, ChatRole, Difficulty, QuizSession, TaskType, WalletAddress,
};

use crate::wallet::CliWallet;

const HELP: &str = "\
commands:
  mint                         mint the agent identity
  task <type> <difficulty>     box|delivery|coding  easy|medium|hard
  validate                     enter the validation stage
  proof                        submit the reputation proof
  challenge                    start the final challenge
  answer <text>                answer the current question
  retry                        start over after a failed challenge
  close                        leave the challenge
  connect <address>            connect a wallet address
  claim                        claim the badge
  status                       show progress
  reset                        start a new agent
  help                         show this list
  quit                         leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mint,
    Task(TaskType, Difficulty),
    Validate,
    Proof,
    Challenge,
    Answer(String),
    Retry,
    Close,
    Connect(WalletAddress),
    Claim,
    Status,
    Reset,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "mint" => Command::Mint,
            "task" => {
                let mut args = rest.split_whitespace();
                let (Some(kind), Some(level)) = (args.next(), args.next()) else {
                    bail!("usage: task <box|delivery|coding> <easy|medium|hard>");
                };
                Command::Task(kind.parse()?, level.parse()?)
            }
            "validate" => Command::Validate,
            "proof" => Command::Proof,
            "challenge" => Command::Challenge,
            "answer" => Command::Answer(rest.to_string()),
            "retry" => Command::Retry,
            "close" => Command::Close,
            "connect" => Command::Connect(rest.parse()?),
            "claim" => Command::Claim,
            "status" => Command::Status,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}' (try `help`)"),
        };
        Ok(Some(command))
    }
}

/// Drives a session from terminal input until `quit` or end of input.
pub struct Player {
    session: AcademySession,
    wallet: Arc<CliWallet>,
    /// Skip real-time waits during validation.
    fast: bool,
    printed_seq: u64,
}

impl Player {
    pub fn new(session: AcademySession, wallet: Arc<CliWallet>, fast: bool) -> Self {
        Self {
            session,
            wallet,
            fast,
            printed_seq: 0,
        }
    }

    pub fn session(&self) -> &AcademySession {
        &self.session
    }

    pub async fn run(&mut self) -> Result<()> {
        self.print_narration();
        println!("{HELP}");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                break;
            };
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            if let Err(err) = self.execute(command).await {
                println!("! {err}");
            }
            self.print_narration();
            if self.session.is_complete() {
                println!("Academy complete. Thanks for playing!");
                break;
            }
        }
        Ok(())
    }

    /// Run one command. Academy errors are recoverable and reported to the
    /// caller without ending the loop.
    pub async fn execute(&mut self, command: Command) -> Result<(), AcademyError> {
        match command {
            Command::Mint => {
                self.session.mint_identity()?;
            }
            Command::Task(kind, level) => {
                let result = self.session.perform_task(kind, level)?;
                println!(
                    "{kind}/{level}: {:+} -> reputation {}",
                    result.reward_delta,
                    self.session.agent().reputation()
                );
            }
            Command::Validate => self.session.proceed_to_validation()?,
            Command::Proof => {
                self.session.submit_validation_proof()?;
                self.wait_for_validation().await;
            }
            Command::Challenge => {
                let quiz = self.session.start_challenge().await?;
                print_latest_reply(&quiz);
            }
            Command::Answer(text) => {
                let quiz = self.session.submit_answer(&text).await?;
                print_latest_reply(&quiz);
            }
            Command::Retry => {
                let quiz = self.session.retry_challenge().await?;
                print_latest_reply(&quiz);
            }
            Command::Close => self.session.close_challenge(),
            Command::Connect(address) => {
                println!("Wallet connected: {address}");
                self.wallet.connect(address);
            }
            Command::Claim => {
                let result = self.session.claim_with_wallet().await?;
                println!("Token ID:  {}", result.token_id);
                println!("Contract:  {}", result.contract_address);
                println!("Tx hash:   {}", result.tx_hash);
            }
            Command::Status => self.print_status(),
            Command::Reset => {
                self.session.reset();
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
        Ok(())
    }

    async fn wait_for_validation(&mut self) {
        if self.fast {
            self.session.run_pending_timers();
            return;
        }
        while let Some(delay) = self.session.next_timer_delay() {
            self.print_narration();
            tokio::time::sleep(delay).await;
            self.session.advance_time(delay);
        }
    }

    fn print_narration(&mut self) {
        for entry in self.session.tutor().entries_since(self.printed_seq) {
            println!("[tutor:{:?}] {}", entry.pose, entry.content);
        }
        self.printed_seq = self.session.tutor().next_seq();
    }

    fn print_status(&self) {
        let agent = self.session.agent();
        println!("Agent:       {}", agent.agent_id().unwrap_or("(none)"));
        println!("Stage:       {:?}", agent.stage());
        println!("Reputation:  {}", agent.reputation());
        println!("Verified:    {}", agent.is_verified());
        for task in agent.task_log() {
            println!(
                "  {} {}/{} {:+}",
                task.timestamp.format("%H:%M:%S"),
                task.task_type,
                task.difficulty,
                task.reward_delta
            );
        }
        if let Some(quiz) = self.session.quiz_session() {
            println!(
                "Challenge:   session {} (done: {}, passed: {:?})",
                quiz.session_id, quiz.done, quiz.passed
            );
        }
        if let Some(claim) = self.session.claim_result() {
            println!("Badge:       token {}", claim.token_id);
        }
    }
}

fn print_latest_reply(quiz: &QuizSession) {
    if let Some(message) = quiz.messages.iter().rev().find(|m| m.role == ChatRole::Tutor) {
        println!("[challenge] {}", message.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::fakes::{FakeBadgeService, FakeQuizService, ScriptedRandom};
    use academy_core::{Clock, ManualClock, QuizTurn, SessionDeps, SystemClock};

    const ADDR: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    #[test]
    fn parses_task_arguments() {
        assert_eq!(
            Command::parse("task coding hard").unwrap(),
            Some(Command::Task(TaskType::Coding, Difficulty::Hard))
        );
        assert!(Command::parse("task coding").is_err());
        assert!(Command::parse("task cooking easy").is_err());
    }

    #[test]
    fn parses_answer_with_spaces() {
        assert_eq!(
            Command::parse("answer  the identity registry ").unwrap(),
            Some(Command::Answer("the identity registry".into()))
        );
    }

    #[test]
    fn blank_line_is_no_command() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn connect_validates_address() {
        assert!(Command::parse("connect 0x1234").is_err());
        assert!(matches!(
            Command::parse(&format!("connect {ADDR}")).unwrap(),
            Some(Command::Connect(_))
        ));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = Command::parse("dance").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }

    #[tokio::test]
    async fn scripted_play_reaches_completion() {
        let quiz = Arc::new(FakeQuizService::new());
        quiz.push_start(Ok(QuizTurn::opening("cli", "Q1?")));
        quiz.push_answer(Ok(QuizTurn::finished("cli", "Passed!", true)));
        let wallet = Arc::new(CliWallet::default());
        let session = AcademySession::new(SessionDeps {
            quiz_service: quiz,
            badge_service: Arc::new(FakeBadgeService::new()),
            wallet: wallet.clone(),
            clock: Arc::new(ManualClock::new(SystemClock.now())),
            random: Box::new(ScriptedRandom::always(0.1)),
        });
        let mut player = Player::new(session, wallet, true);

        let connect = format!("connect {ADDR}");
        let script = [
            "mint",
            "task box easy",
            "task box easy",
            "task delivery easy",
            "task coding easy",
            "task coding easy",
            "validate",
            "proof",
            "challenge",
            "answer identity, reputation, validation",
            connect.as_str(),
            "claim",
        ];
        for line in script {
            let command = Command::parse(line).unwrap().unwrap();
            player.execute(command).await.unwrap();
        }

        assert!(player.session().is_complete());
    }

    #[tokio::test]
    async fn claim_without_wallet_is_reported() {
        let wallet = Arc::new(CliWallet::default());
        let session = AcademySession::new(SessionDeps {
            quiz_service: Arc::new(FakeQuizService::new()),
            badge_service: Arc::new(FakeBadgeService::new()),
            wallet: wallet.clone(),
            clock: Arc::new(SystemClock),
            random: Box::new(ScriptedRandom::always(0.1)),
        });
        let mut player = Player::new(session, wallet, true);

        let err = player.execute(Command::Claim).await.unwrap_err();
        assert_eq!(err, AcademyError::WalletNotConnected);
    }
}
