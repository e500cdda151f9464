//! Ticket lottery
//!
//! Users buy any number of tickets at a fixed price; each ticket is one
//! slot in the draw, so buying more tickets raises the odds linearly.
//! The whole pot goes to the holder of the drawn slot.

use crate::error::{Error, GameKind, Result};
use rand::Rng;
use treasury_core::{Bank, Coins, UserId};

/// An open lottery
#[derive(Debug, Clone)]
pub struct Lottery {
    /// Cost of one ticket
    pub ticket_price: Coins,

    /// One entry per ticket sold; users repeat
    pub participants: Vec<UserId>,
}

/// Outcome of drawing the lottery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Nobody bought a ticket; the lottery still ends
    NoParticipants,

    /// A slot was drawn and the pot paid out
    Winner {
        /// Holder of the drawn slot
        user: UserId,
        /// Full pot credited
        amount: Coins,
    },
}

/// Lottery engine, at most one lottery at a time
#[derive(Debug, Default)]
pub struct LotteryEngine {
    active: Option<Lottery>,
}

impl LotteryEngine {
    /// Create an engine with no lottery running
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a lottery at the given ticket price
    pub fn start(&mut self, ticket_price: Coins) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::AlreadyRunning(GameKind::Lottery));
        }
        if ticket_price == 0 {
            return Err(Error::InvalidParameters(
                "ticket price must be positive".to_string(),
            ));
        }

        self.active = Some(Lottery {
            ticket_price,
            participants: Vec::new(),
        });

        tracing::info!(ticket_price, "Lottery started");
        Ok(())
    }

    /// Buy up to `qty` tickets for a user
    ///
    /// Each ticket is charged separately; the purchase stops at the
    /// first failed charge and reports how many tickets were actually
    /// bought. A user whose first charge fails ends up with no slots
    /// and may try again later.
    pub fn buy_tickets(&mut self, bank: &mut Bank, user: &UserId, qty: u32) -> Result<u32> {
        let lottery = self.active.as_mut().ok_or(Error::NoActiveLottery)?;

        if lottery.participants.contains(user) {
            return Err(Error::AlreadyParticipated(user.clone()));
        }

        let mut bought = 0;
        for _ in 0..qty {
            match bank.debit(user, lottery.ticket_price) {
                Ok(_) => {
                    lottery.participants.push(user.clone());
                    bought += 1;
                }
                Err(treasury_core::Error::InsufficientFunds { .. }) => break,
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(user = %user, bought, requested = qty, "Lottery tickets bought");
        Ok(bought)
    }

    /// Total pot of the open lottery
    pub fn pot(&self) -> Result<Coins> {
        let lottery = self.active.as_ref().ok_or(Error::NoActiveLottery)?;
        Ok(lottery.participants.len() as Coins * lottery.ticket_price)
    }

    /// Whether a lottery is open
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Draw a slot, pay the pot, and end the lottery
    ///
    /// The lottery ends whatever happens, so a draw with no tickets
    /// sold frees the slot for the next one.
    pub fn draw<R: Rng>(&mut self, bank: &mut Bank, rng: &mut R) -> Result<DrawOutcome> {
        let lottery = self.active.take().ok_or(Error::NoActiveLottery)?;

        if lottery.participants.is_empty() {
            tracing::info!("Lottery drawn with no tickets sold");
            return Ok(DrawOutcome::NoParticipants);
        }

        let pot = lottery.participants.len() as Coins * lottery.ticket_price;
        let slot = rng.gen_range(0..lottery.participants.len());
        let winner = lottery.participants[slot].clone();

        bank.credit(&winner, pot)?;

        tracing::info!(winner = %winner, pot, tickets = lottery.participants.len(), "Lottery drawn");
        Ok(DrawOutcome::Winner {
            user: winner,
            amount: pot,
        })
    }
}
