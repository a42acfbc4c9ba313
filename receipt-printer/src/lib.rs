//! # receipt-printer
//!
//! ESC/POS receipt printing, low-level capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Windows-1252 encoding for western thermal printers
//! - Delivery to the local print bridge over HTTP
//!
//! WHAT goes on a receipt is decided by the service (`dine-cloud::printing`).
//!
//! ## Example
//!
//! ```ignore
//! use receipt_printer::{BridgePrinter, EscPosBuilder, Printer};
//!
//! let mut builder = EscPosBuilder::new(48);
//! builder.center().double_size().line("Table 4").reset_size();
//! builder.sep_double();
//! builder.left().line_lr("2 x Café crème", "7.00");
//! builder.cut_feed(3);
//!
//! let printer = BridgePrinter::new("http://localhost:8080/print")?;
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use encoding::{encode_cp1252, pad_text, text_width, truncate_text};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use printer::{BridgePrinter, DEFAULT_BRIDGE_URL, Printer};
