mod coordinates;
mod customer;
mod geofence;
mod order;
mod place;
mod route;
mod shop;

pub use coordinates::Coordinates;
pub use customer::{CustomerAddressUpdate, StoredCustomerLocation};
pub use geofence::GeofencePolygon;
pub use order::{DeliveryOrder, OrderItem, OrderStatus, OrderSummary, TrackingSnapshot};
pub use place::{postal_code, AddressComponent, GeocodedAddress, ReverseGeocodedAddress};
pub use route::{RouteSummary, NOT_AVAILABLE};
pub use shop::{Discovery, Shop, ShopRecord};
