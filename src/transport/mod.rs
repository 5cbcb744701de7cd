pub mod bt_discovery;
pub mod gatt;
pub mod guard;
#[cfg(test)]
pub mod mock;
pub mod traits;

pub use gatt::GattLink;
pub use traits::{Ack, DeviceLink};
