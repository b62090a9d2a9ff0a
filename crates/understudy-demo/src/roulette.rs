//! A roulette table that takes bets.

use std::sync::{Arc, Mutex, PoisonError};
use understudy_core::{DoubleError, Seam, TargetId};

#[derive(Debug, Clone)]
pub struct Roulette {
    bet_on_number: Seam<u8, ()>,
    bets: Arc<Mutex<Vec<u8>>>,
}

impl Default for Roulette {
    fn default() -> Self {
        Self::new()
    }
}

impl Roulette {
    pub fn new() -> Self {
        let bets = Arc::new(Mutex::new(Vec::new()));
        let placed = Arc::clone(&bets);
        Self {
            bet_on_number: Seam::new(TargetId::new(), "bet_on_number", move |number: u8| {
                placed.lock().unwrap_or_else(PoisonError::into_inner).push(number);
            }),
            bets,
        }
    }

    pub fn bet_on_number(&self, number: u8) -> Result<(), DoubleError> {
        self.bet_on_number.call(number)?;
        Ok(())
    }

    pub fn bet_on_number_seam(&self) -> &Seam<u8, ()> {
        &self.bet_on_number
    }

    /// Bets that reached the table.
    pub fn bets(&self) -> Vec<u8> {
        self.bets.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
