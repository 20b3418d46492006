//! Fetch ordering
//!
//! Every request a controller issues is stamped with a strictly increasing id.
//! A response may be applied only when its id is at least the highest id
//! applied so far, so under reordering the last-issued request wins. Nothing
//! is cancelled; late losers are simply dropped.

pub type FetchId = u64;

#[derive(Debug, Clone)]
pub struct FetchEpoch {
    next_fetch_id: FetchId,
    last_received_fetch_id: FetchId,
    in_flight: usize,
}

impl Default for FetchEpoch {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchEpoch {
    pub fn new() -> Self {
        Self {
            next_fetch_id: 1,
            last_received_fetch_id: 1,
            in_flight: 0,
        }
    }

    /// Stamp a new request.
    pub fn issue(&mut self) -> FetchId {
        self.next_fetch_id += 1;
        self.in_flight += 1;
        self.next_fetch_id
    }

    /// Decide whether the response to `fetch_id` may be applied, advancing the
    /// high-water mark when it may.
    pub fn accept(&mut self, fetch_id: FetchId) -> bool {
        if fetch_id < self.last_received_fetch_id {
            return false;
        }
        self.last_received_fetch_id = fetch_id;
        true
    }

    /// Mark one issued request as finished, whatever its outcome.
    pub fn finish(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight > 0
    }

    pub fn last_received(&self) -> FetchId {
        self.last_received_fetch_id
    }
}
