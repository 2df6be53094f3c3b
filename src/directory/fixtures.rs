//! Seed workers for local development and tests.

use tracing::info;

use super::model::WorkerProfile;
use crate::error::DatabaseError;
use crate::store::ProfileStore;

/// Five Dhaka-area workers used to seed an empty directory.
pub fn seed_workers() -> Vec<WorkerProfile> {
    vec![
        WorkerProfile::new("worker1", "Rahim Mia", "Plumber", "Mirpur")
            .with_gender("Male")
            .with_institute("Dhaka Polytechnic")
            .with_contact("01712345678"),
        WorkerProfile::new("worker2", "Karima Begum", "Electrician", "Uttara")
            .with_gender("Female")
            .with_institute("Technical Training Center")
            .with_contact("01898765432"),
        WorkerProfile::new("worker3", "Shofiq Ahmed", "Carpenter", "Mohammadpur")
            .with_gender("Male")
            .with_institute("Mohammadpur Technical")
            .with_contact("01911223344"),
        WorkerProfile::new("worker4", "Nasrin Sultana", "Painter", "Dhanmondi")
            .with_gender("Female")
            .with_institute("Shilpakala Academy")
            .with_contact("01655577788"),
        WorkerProfile::new("worker5", "Abdul Karim", "Mason", "Motijheel")
            .with_gender("Male")
            .with_institute("BUET")
            .with_contact("01533445566"),
    ]
}

/// Load the seed workers into `store` if its directory is empty.
///
/// Returns how many workers were written.
pub async fn seed_if_empty(store: &dyn ProfileStore) -> Result<usize, DatabaseError> {
    if !store.list_workers().await?.is_empty() {
        return Ok(0);
    }
    let workers = seed_workers();
    for worker in &workers {
        store.upsert_worker(worker).await?;
    }
    info!(count = workers.len(), "Seeded worker directory");
    Ok(workers.len())
}
