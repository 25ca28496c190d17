use crate::error::{PeerPayError, Result};
use crate::ledger::BalanceLedger;
use crate::network::PeerDirectory;
use std::fmt;
use std::io::{BufRead, Write};

const BALANCE: &str = "balance";
const PAY: &str = "pay";
const EXIT: &str = "exit";
const SUPPORTED_COMMANDS: [&str; 3] = [BALANCE, PAY, EXIT];

/// Read and decrease the local balance
pub trait BalanceManager {
    fn balance(&self) -> i64;
    fn decrease(&self, value: i64);
}

/// Deliver an amount to a peer by name
pub trait PaymentSender {
    fn send(&self, name: &str, amount: &str) -> Result<usize>;
}

impl BalanceManager for BalanceLedger {
    fn balance(&self) -> i64 {
        BalanceLedger::balance(self)
    }

    fn decrease(&self, value: i64) {
        BalanceLedger::decrease(self, value)
    }
}

impl PaymentSender for PeerDirectory {
    fn send(&self, name: &str, amount: &str) -> Result<usize> {
        self.send_envelope(format!("{name} {amount}").as_bytes())
    }
}

impl<T: BalanceManager + ?Sized> BalanceManager for &T {
    fn balance(&self) -> i64 {
        (**self).balance()
    }

    fn decrease(&self, value: i64) {
        (**self).decrease(value)
    }
}

impl<T: PaymentSender + ?Sized> PaymentSender for &T {
    fn send(&self, name: &str, amount: &str) -> Result<usize> {
        (**self).send(name, amount)
    }
}

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Balance,
    /// `amount` is forwarded to the peer exactly as typed
    Pay {
        name: String,
        amount: String,
        value: i64,
    },
    Exit,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    PayUsage,
    NonIntegerAmount,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::PayUsage => write!(f, "Pay command invalid, example 'pay Bob 10'"),
            CommandError::NonIntegerAmount => write!(
                f,
                "Only integer values allowed to specify in the 'pay' command"
            ),
        }
    }
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Command, CommandError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let tokens: Vec<&str> = line.splitn(3, ' ').collect();
        match tokens[0] {
            BALANCE => Ok(Command::Balance),
            PAY => {
                if tokens.len() != 3 {
                    return Err(CommandError::PayUsage);
                }
                let value = tokens[2]
                    .parse::<i64>()
                    .map_err(|_| CommandError::NonIntegerAmount)?;
                Ok(Command::Pay {
                    name: tokens[1].to_string(),
                    amount: tokens[2].to_string(),
                    value,
                })
            }
            EXIT => Ok(Command::Exit),
            other => Ok(Command::Unknown(other.to_string())),
        }
    }
}

/// Interactive front end over a balance and a payment route
pub struct Keyboard<B, S> {
    balance: B,
    sender: S,
}

impl<B: BalanceManager, S: PaymentSender> Keyboard<B, S> {
    pub fn new(balance: B, sender: S) -> Self {
        Self { balance, sender }
    }

    /// Prompt and execute commands until `exit` or end of input
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<()> {
        let mut line = String::new();
        loop {
            write!(output, "> ")?;
            output.flush()?;

            line.clear();
            let read = input
                .read_line(&mut line)
                .map_err(|e| PeerPayError::Io(format!("failed to scan from stdin, {e}")))?;
            if read == 0 {
                return Ok(());
            }

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    writeln!(output, "{e}")?;
                    continue;
                }
            };

            match command {
                Command::Balance => writeln!(output, "{}", self.balance.balance())?,
                Command::Pay {
                    name,
                    amount,
                    value,
                } => {
                    if let Err(e) = self.sender.send(&name, &amount) {
                        writeln!(output, "failed to write message to peer, {e}")?;
                        continue;
                    }
                    self.balance.decrease(value);
                }
                Command::Exit => {
                    writeln!(output, "Goodbye!")?;
                    return Ok(());
                }
                Command::Unknown(_) => writeln!(
                    output,
                    "unknown command, only {} supported",
                    SUPPORTED_COMMANDS.join(",")
                )?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::io::Cursor;

    #[derive(Default)]
    struct FakeBalance(Cell<i64>);

    impl BalanceManager for FakeBalance {
        fn balance(&self) -> i64 {
            self.0.get()
        }

        fn decrease(&self, value: i64) {
            self.0.set(self.0.get() - value)
        }
    }

    #[derive(Default)]
    struct FakeSender {
        sent: RefCell<Vec<(String, String)>>,
        known: Vec<&'static str>,
    }

    impl PaymentSender for FakeSender {
        fn send(&self, name: &str, amount: &str) -> Result<usize> {
            if !self.known.iter().any(|known| *known == name) {
                return Err(PeerPayError::PeerNotConnected(name.to_string()));
            }
            self.sent
                .borrow_mut()
                .push((name.to_string(), amount.to_string()));
            Ok(amount.len())
        }
    }

    fn run(script: &str, balance: &FakeBalance, sender: &FakeSender) -> String {
        let mut output = Vec::new();
        Keyboard::new(balance, sender)
            .run(Cursor::new(script), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("balance\n"), Ok(Command::Balance));
        assert_eq!(Command::parse("exit"), Ok(Command::Exit));
        assert_eq!(
            Command::parse("pay Bob 10\n"),
            Ok(Command::Pay {
                name: "Bob".to_string(),
                amount: "10".to_string(),
                value: 10,
            })
        );
        assert_eq!(Command::parse("pay Bob"), Err(CommandError::PayUsage));
        assert_eq!(
            Command::parse("pay Bob ten"),
            Err(CommandError::NonIntegerAmount)
        );
        assert_eq!(
            Command::parse("pay Bob 10 extra"),
            Err(CommandError::NonIntegerAmount)
        );
        assert_eq!(
            Command::parse("withdraw"),
            Ok(Command::Unknown("withdraw".to_string()))
        );
    }

    #[test]
    fn test_successful_payment_decreases_balance() {
        let balance = FakeBalance::default();
        let sender = FakeSender {
            known: vec!["Bob"],
            ..Default::default()
        };

        let output = run("pay Bob 10\nbalance\nexit\n", &balance, &sender);

        assert_eq!(balance.balance(), -10);
        assert_eq!(
            sender.sent.borrow().as_slice(),
            &[("Bob".to_string(), "10".to_string())]
        );
        assert_eq!(output, "> > -10\n> Goodbye!\n");
    }

    #[test]
    fn test_failed_payment_keeps_balance() {
        let balance = FakeBalance::default();
        let sender = FakeSender::default();

        let output = run("pay Carol 3\n", &balance, &sender);

        assert_eq!(balance.balance(), 0);
        assert!(output.contains("failed to write message to peer, peer not connected: Carol"));
    }

    #[test]
    fn test_usage_errors_and_eof() {
        let balance = FakeBalance::default();
        let sender = FakeSender::default();

        let output = run("pay\nhello\n", &balance, &sender);

        assert!(output.contains("Pay command invalid, example 'pay Bob 10'"));
        assert!(output.contains("unknown command, only balance,pay,exit supported"));
        assert!(output.ends_with("> "));
    }
}
