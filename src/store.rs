use crate::model::{
    GpsPing, GuestMessage, HandoffState, MessageCategory, MileageAnomaly, Trip, Vehicle,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

// In-memory stand-in for the persistence collaborator. Everything the
// engine needs from storage goes through here, so the real database
// lands behind the same methods. All mutation happens under one lock,
// which is what gives transition_handoff its compare-and-set semantics.

#[derive(Default)]
struct Inner {
    trips: HashMap<i32, Trip>,
    vehicles: HashMap<i32, Vehicle>,
    // Only the newest two pings per trip are ever consulted.
    pings: HashMap<i32, (Option<GpsPing>, Option<GpsPing>)>,
    messages: HashMap<(i32, MessageCategory), GuestMessage>,
    anomalies: Vec<MileageAnomaly>,
}

pub struct Store {
    inner: Mutex<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn insert_trip(&self, trip: Trip) {
        self.inner.lock().unwrap().trips.insert(trip.id, trip);
    }

    pub fn insert_vehicle(&self, vehicle: Vehicle) {
        self.inner
            .lock()
            .unwrap()
            .vehicles
            .insert(vehicle.id, vehicle);
    }

    pub fn get_trip(&self, trip_id: i32) -> Option<Trip> {
        self.inner.lock().unwrap().trips.get(&trip_id).cloned()
    }

    pub fn get_vehicle(&self, vehicle_id: i32) -> Option<Vehicle> {
        self.inner
            .lock()
            .unwrap()
            .vehicles
            .get(&vehicle_id)
            .cloned()
    }

    pub fn vehicles_for_host(&self, host_id: i32) -> Vec<Vehicle> {
        let mut vehicles: Vec<Vehicle> = self
            .inner
            .lock()
            .unwrap()
            .vehicles
            .values()
            .filter(|v| v.host_id == host_id)
            .cloned()
            .collect();
        vehicles.sort_by_key(|v| v.id);
        vehicles
    }

    /// Apply `f` to the trip under the store lock and return its result
    /// along with the updated record.
    pub fn update_trip<F, T>(&self, trip_id: i32, f: F) -> Option<(Trip, T)>
    where
        F: FnOnce(&mut Trip) -> T,
    {
        let mut inner = self.inner.lock().unwrap();
        let trip = inner.trips.get_mut(&trip_id)?;
        let out = f(trip);
        Some((trip.clone(), out))
    }

    pub fn update_vehicle<F>(&self, vehicle_id: i32, f: F) -> Option<Vehicle>
    where
        F: FnOnce(&mut Vehicle),
    {
        let mut inner = self.inner.lock().unwrap();
        let vehicle = inner.vehicles.get_mut(&vehicle_id)?;
        f(vehicle);
        Some(vehicle.clone())
    }

    /// Compare-and-set on the per-trip handoff state. Transitions only
    /// if the current state matches `expected`; otherwise returns the
    /// state actually found so a duplicate caller can take the
    /// idempotent path instead of erroring.
    pub fn transition_handoff(
        &self,
        trip_id: i32,
        expected: HandoffState,
        next: HandoffState,
    ) -> Option<Result<HandoffState, HandoffState>> {
        let mut inner = self.inner.lock().unwrap();
        let trip = inner.trips.get_mut(&trip_id)?;
        if trip.handoff_state == expected {
            trip.handoff_state = next;
            Some(Ok(next))
        } else {
            Some(Err(trip.handoff_state))
        }
    }

    /// Record an approach ping, last-write-wins on timestamp. Returns
    /// (previous, current) as seen after the write; a stale ping (older
    /// than the newest on file) is dropped.
    pub fn record_ping(&self, ping: GpsPing) -> (Option<GpsPing>, GpsPing) {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner.pings.entry(ping.trip_id).or_default();
        match &slot.1 {
            Some(current) if current.time > ping.time => {
                (slot.0.clone(), current.clone())
            }
            _ => {
                slot.0 = slot.1.take();
                slot.1 = Some(ping.clone());
                (slot.0.clone(), ping)
            }
        }
    }

    /// Create the (trip, category) message only if none exists yet.
    /// Returns None when the natural key is already taken, which is the
    /// signal not to re-fire the notification.
    pub fn insert_message_if_absent(
        &self,
        trip_id: i32,
        category: MessageCategory,
        body: String,
    ) -> Option<GuestMessage> {
        let mut inner = self.inner.lock().unwrap();
        if inner.messages.contains_key(&(trip_id, category)) {
            return None;
        }
        let message = GuestMessage {
            id: Uuid::new_v4(),
            trip_id,
            category,
            body,
            created_at: Utc::now(),
        };
        inner.messages.insert((trip_id, category), message.clone());
        Some(message)
    }

    pub fn get_message(&self, trip_id: i32, category: MessageCategory) -> Option<GuestMessage> {
        self.inner
            .lock()
            .unwrap()
            .messages
            .get(&(trip_id, category))
            .cloned()
    }

    pub fn insert_anomaly(&self, anomaly: MileageAnomaly) -> MileageAnomaly {
        let mut inner = self.inner.lock().unwrap();
        inner.anomalies.push(anomaly.clone());
        anomaly
    }

    pub fn anomalies_for_vehicle(&self, vehicle_id: i32) -> Vec<MileageAnomaly> {
        self.inner
            .lock()
            .unwrap()
            .anomalies
            .iter()
            .filter(|a| a.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }
}
