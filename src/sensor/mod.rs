pub mod commands;
pub mod driver;
pub mod response;
pub mod traits;
#[cfg(feature = "embedded")]
pub mod uart;

pub use commands::{CharBuffer, SensorCommand};
pub use driver::{Fingerprint, SearchReply};
pub use response::ResponseCode;
pub use traits::{LinkError, SensorLink};
#[cfg(feature = "embedded")]
pub use uart::UartSensorLink;
