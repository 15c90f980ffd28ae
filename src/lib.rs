//! SLCAN protocol engine and CAN-session manager for a serial-bridged CAN
//! adapter.
//!
//! This crate implements the device side of the LAWICEL "SLCAN" ASCII line
//! protocol: it consumes a stream of command lines from a host (over
//! whatever serial transport a binary wires up — UART, Bluetooth SPP, USB
//! CDC) and drives an abstract CAN controller accordingly, producing
//! command replies and asynchronous received-frame lines on an egress
//! queue. The serial transport and the CAN controller driver are supplied
//! by the embedder through [`session::CanDriver`] and [`egress::SerialEgress`];
//! this crate owns only the protocol engine between them.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`splitter`] | Reassembles inbound bytes into CR-terminated command lines. |
//! | [`command`] | Parses one command line's grammar. |
//! | [`session`] | Owns the CAN-controller lifecycle and bitrate/mode state. |
//! | [`frame`] | Converts between binary CAN frames and SLCAN ASCII. |
//! | [`egress`] | Serializes replies and frame lines under a send-lock discipline. |
//! | [`dispatch`] | Wires the above into one command-processing pipeline. |
//! | [`pump`] | The permanently-running CAN receive pump task. |
//! | [`config`] | Bring-up configuration knobs. |
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::{Mutex, Notify};
//!
//! use slcan_adapter_core::config::Config;
//! use slcan_adapter_core::dispatch::CommandProcessor;
//! use slcan_adapter_core::egress::egress_channel;
//! use slcan_adapter_core::session::SessionManager;
//!
//! # async fn wire_up(driver: impl slcan_adapter_core::session::CanDriver + 'static,
//! #                   transport: impl slcan_adapter_core::egress::SerialEgress + 'static) {
//! let session = Arc::new(Mutex::new(SessionManager::new(driver)));
//! let pump_signal = session.lock().await.pump_signal();
//! let (egress, sender) = egress_channel(8, transport, Arc::new(Notify::new()));
//!
//! tokio::spawn(sender.run());
//! tokio::spawn(slcan_adapter_core::pump::run_receive_pump(
//!     session.clone(),
//!     pump_signal,
//!     egress.clone(),
//! ));
//!
//! let mut processor = CommandProcessor::new(session, egress, Config::default());
//! processor.on_ingress(b"V\r").await;
//! # }
//! ```

pub mod command;
pub mod config;
pub mod dispatch;
pub mod egress;
pub mod error;
pub mod frame;
pub mod pump;
pub mod session;
pub mod splitter;

pub use command::Command;
pub use config::Config;
pub use dispatch::CommandProcessor;
pub use egress::{EgressMessage, EgressQueue, SerialEgress};
pub use error::{AdapterError, DecodeError, DriverError, SessionError};
pub use frame::{decode_frame, encode_frame, CanFrame, EncodeOptions};
pub use session::{Bitrate, CanDriver, Mode, SessionManager};
