//! Notification port trait for trade and no-opportunity alerts.

use crate::domain::error::SievetraderError;
use crate::domain::position::Fill;
use chrono::NaiveDate;

pub trait NotifyPort {
    /// Announce a fill made by the automation path.
    fn notify_fill(&self, fill: &Fill, screen_name: &str) -> Result<(), SievetraderError>;

    /// Announce that a screen found nothing actionable today.
    fn notify_no_opportunities(
        &self,
        screen_name: &str,
        date: NaiveDate,
    ) -> Result<(), SievetraderError>;
}
