//! Session context holding the user's shortlists.
//!
//! Built once when a session starts and handed to whatever renders manufacturer
//! cards, the compare table or the favorites page. Both collections share one
//! durable backend but use separate slots.

use crate::app_response::AppResponse;
use crate::config::CollectionConfig;
use crate::entity::Manufacturer;
use crate::notice::Notice;
use crate::slot::DurableSlot;
use crate::store::{ToggleOutcome, ToggledCollection};

pub type Shortlist<S> = ToggledCollection<Manufacturer, S>;

pub struct Shortlists<S> {
    favorites: Shortlist<S>,
    compare: Shortlist<S>,
}

impl<S> Shortlists<S>
where
    S: DurableSlot + Clone,
{
    /// Rehydrates favorites (unbounded) and compare (capped) from `slots`.
    pub fn open(slots: S) -> Self {
        Self::open_with(slots, CollectionConfig::favorites(), CollectionConfig::compare())
    }

    pub fn open_with(slots: S, favorites: CollectionConfig, compare: CollectionConfig) -> Self {
        Self {
            favorites: ToggledCollection::initialize(slots.clone(), favorites),
            compare: ToggledCollection::initialize(slots, compare),
        }
    }
}

impl<S> Shortlists<S>
where
    S: DurableSlot,
{
    pub fn favorites(&self) -> &Shortlist<S> {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut Shortlist<S> {
        &mut self.favorites
    }

    pub fn compare(&self) -> &Shortlist<S> {
        &self.compare
    }

    pub fn compare_mut(&mut self) -> &mut Shortlist<S> {
        &mut self.compare
    }

    pub fn toggle_favorite(
        &mut self,
        manufacturer: Manufacturer,
    ) -> Result<(ToggleOutcome, Notice), AppResponse> {
        toggle_with_notice(&mut self.favorites, manufacturer)
    }

    pub fn toggle_compare(
        &mut self,
        manufacturer: Manufacturer,
    ) -> Result<(ToggleOutcome, Notice), AppResponse> {
        toggle_with_notice(&mut self.compare, manufacturer)
    }

    pub fn clear_favorites(&mut self) -> Result<Notice, AppResponse> {
        self.favorites.clear()?;
        Ok(Notice::cleared(self.favorites.config()))
    }

    pub fn clear_compare(&mut self) -> Result<Notice, AppResponse> {
        self.compare.clear()?;
        Ok(Notice::cleared(self.compare.config()))
    }

    /// Deletes both slots, e.g. when the user signs out on a shared device.
    pub fn purge_all(&mut self) -> Result<(), AppResponse> {
        self.favorites.purge()?;
        self.compare.purge()?;
        Ok(())
    }
}

fn toggle_with_notice<S: DurableSlot>(
    list: &mut Shortlist<S>,
    manufacturer: Manufacturer,
) -> Result<(ToggleOutcome, Notice), AppResponse> {
    let outcome = list.toggle(manufacturer)?;
    Ok((outcome, Notice::for_outcome(outcome, list.config())))
}
