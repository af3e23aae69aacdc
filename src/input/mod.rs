//! Module defining the parsing logic used to convert a CSV command log into validated commands that can be replayed
//! against the engine.
//!
//! Columns: `command, actor, target, amount, detail`. `actor` is always the calling user; what `target`, `amount` and
//! `detail` mean depends on the command.

use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{
    BookingId, ComplaintId, DepositDecision, DepositRequestId, ItemId, ListingType, Money, Role,
    UserId,
};
use crate::error::{Error, validation_error};


/// A replayable marketplace operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Register {
        user: UserId,
        role: Role,
        opening_balance: Money,
    },
    List {
        owner: UserId,
        item: ItemId,
        price: Money,
        listing: ListingType,
    },
    Request {
        borrower: UserId,
        item: ItemId,
        start: NaiveDate,
        end: NaiveDate,
    },
    Accept {
        owner: UserId,
        booking: BookingId,
    },
    Reject {
        owner: UserId,
        booking: BookingId,
    },
    Pay {
        borrower: UserId,
        booking: BookingId,
    },
    Buy {
        buyer: UserId,
        item: ItemId,
    },
    Handover {
        borrower: UserId,
        booking: BookingId,
    },
    StartReturn {
        caller: UserId,
        booking: BookingId,
    },
    Return {
        borrower: UserId,
        booking: BookingId,
    },
    Receipt {
        owner: UserId,
        booking: BookingId,
    },
    Complain {
        complainer: UserId,
        booking: BookingId,
        description: String,
    },
    Verify {
        admin: UserId,
        complaint: ComplaintId,
    },
    Dismiss {
        admin: UserId,
        complaint: ComplaintId,
        notes: Option<String>,
    },
    Fine {
        admin: UserId,
        complaint: ComplaintId,
        amount: Money,
    },
    Rollback {
        admin: UserId,
        booking: BookingId,
    },
    Deposit {
        user: UserId,
        amount: Money,
        external_tx_id: String,
    },
    Withdraw {
        user: UserId,
        amount: Money,
        upi_id: String,
    },
    Resolve {
        admin: UserId,
        request: DepositRequestId,
        decision: DepositDecision,
        message: Option<String>,
    },
    Block {
        admin: UserId,
        user: UserId,
        blocked: bool,
    },
    Sweep {
        today: NaiveDate,
    },
}

/// Parses the data provided by the reader and returns an iterator over the parsing results
pub(crate) fn parse_commands(reader: impl Read) -> impl Iterator<Item = Result<Command, Error>> {
    let csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    csv_reader
        .into_deserialize::<RawCommand>()
        .map(|result| {
            let raw = result?;
            Command::try_from(raw)
        })
}

// Intermediate type mirroring the CSV columns
#[derive(Deserialize)]
struct RawCommand {
    command: String,
    #[serde(default)]
    actor: Option<u32>,
    #[serde(default)]
    target: Option<u32>,
    #[serde(default)]
    amount: Option<Decimal>,
    #[serde(default)]
    detail: Option<String>,
}

impl RawCommand {
    fn actor(&self) -> Result<UserId, Error> {
        self.actor
            .map(UserId::new)
            .ok_or_else(|| self.missing("actor"))
    }

    fn target(&self) -> Result<u32, Error> {
        self.target.ok_or_else(|| self.missing("target"))
    }

    fn amount(&self) -> Result<Money, Error> {
        self.amount.ok_or_else(|| self.missing("amount"))
    }

    fn detail(&self) -> Option<String> {
        self.detail.clone().filter(|d| !d.is_empty())
    }

    fn required_detail(&self) -> Result<String, Error> {
        self.detail().ok_or_else(|| self.missing("detail"))
    }

    fn missing(&self, column: &str) -> Error {
        validation_error(format!("no {column} provided for {}", self.command))
    }

    fn parse_detail<T: std::str::FromStr<Err = String>>(&self, default: T) -> Result<T, Error> {
        match self.detail() {
            Some(detail) => detail
                .parse()
                .map_err(|msg| validation_error(format!("{}: {msg}", self.command))),
            None => Ok(default),
        }
    }
}

impl TryFrom<RawCommand> for Command {
    type Error = crate::error::Error;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        let command = match raw.command.to_ascii_lowercase().as_str() {
            "register" => Command::Register {
                user: raw.actor()?,
                role: raw.parse_detail(Role::Member)?,
                opening_balance: raw.amount.unwrap_or(Decimal::ZERO),
            },
            "list" => Command::List {
                owner: raw.actor()?,
                item: ItemId::new(raw.target()?),
                price: raw.amount()?,
                listing: raw.parse_detail(ListingType::Rent)?,
            },
            "request" => {
                let (start, end) = parse_period(&raw.required_detail()?)?;
                Command::Request {
                    borrower: raw.actor()?,
                    item: ItemId::new(raw.target()?),
                    start,
                    end,
                }
            }
            "accept" => Command::Accept {
                owner: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "reject" => Command::Reject {
                owner: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "pay" => Command::Pay {
                borrower: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "buy" => Command::Buy {
                buyer: raw.actor()?,
                item: ItemId::new(raw.target()?),
            },
            "handover" => Command::Handover {
                borrower: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "start_return" => Command::StartReturn {
                caller: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "return" => Command::Return {
                borrower: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "receipt" => Command::Receipt {
                owner: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "complain" => Command::Complain {
                complainer: raw.actor()?,
                booking: BookingId::new(raw.target()?),
                description: raw.required_detail()?,
            },
            "verify" => Command::Verify {
                admin: raw.actor()?,
                complaint: ComplaintId::new(raw.target()?),
            },
            "dismiss" => Command::Dismiss {
                admin: raw.actor()?,
                complaint: ComplaintId::new(raw.target()?),
                notes: raw.detail(),
            },
            "fine" => Command::Fine {
                admin: raw.actor()?,
                complaint: ComplaintId::new(raw.target()?),
                amount: raw.amount()?,
            },
            "rollback" => Command::Rollback {
                admin: raw.actor()?,
                booking: BookingId::new(raw.target()?),
            },
            "deposit" => Command::Deposit {
                user: raw.actor()?,
                amount: raw.amount()?,
                external_tx_id: raw.required_detail()?,
            },
            "withdraw" => Command::Withdraw {
                user: raw.actor()?,
                amount: raw.amount()?,
                upi_id: raw.required_detail()?,
            },
            "approve" | "decline" => Command::Resolve {
                admin: raw.actor()?,
                request: DepositRequestId::new(raw.target()?),
                decision: if raw.command.eq_ignore_ascii_case("approve") {
                    DepositDecision::Approved
                } else {
                    DepositDecision::Rejected
                },
                message: raw.detail(),
            },
            "block" | "unblock" => Command::Block {
                admin: raw.actor()?,
                user: UserId::new(raw.target()?),
                blocked: raw.command.eq_ignore_ascii_case("block"),
            },
            "sweep" => Command::Sweep {
                today: parse_date(&raw.required_detail()?)?,
            },
            other => {
                return Err(validation_error(format!("unknown command: {other}")));
            }
        };
        Ok(command)
    }
}

/// `2026-10-20` for a single day, `2026-10-20..2026-10-22` for a range.
fn parse_period(raw: &str) -> Result<(NaiveDate, NaiveDate), Error> {
    match raw.split_once("..") {
        Some((start, end)) => Ok((parse_date(start)?, parse_date(end)?)),
        None => {
            let day = parse_date(raw)?;
            Ok((day, day))
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| validation_error(format!("invalid date {raw}: {e}")))
}
