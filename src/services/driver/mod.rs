//! Out-of-process access through the `aleto-driver` executable.
//!
//! [`DriverClient`] implements `Database` by encoding each operation as a
//! [`DriverCommand`], sending it through a [`Transport`] and decoding the
//! [`Answer`]. [`DriverServer`] is the other end, run by the executable.

mod client;
mod command;
mod locate;
mod protocol;
mod server;
mod transport;

pub use client::DriverClient;
pub use command::{DriverCommand, PAGE_SIZE};
pub use locate::{
    DRIVER_MODE_ENV, DRIVER_PATH_ENV, DriverOptions, TransportKind, default_driver_path,
    driver_path_in, executable_dir,
};
pub use protocol::{Answer, Payload, Request, escape_and_wrap};
pub use server::{DriverServer, execute};
pub use transport::{OneShotTransport, PersistentTransport, SERVE_COMMAND, Transport};
