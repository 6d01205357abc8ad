use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// Payload for persisting a customer's resolved address upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerAddressUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub pincode: String,
}

/// The customer's last persisted position, as the backend stores it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredCustomerLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub pincode: Option<String>,
}

impl StoredCustomerLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
