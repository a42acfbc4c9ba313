//! Receipt printing: rendering and best-effort delivery to the print bridge

mod receipt;

pub use receipt::{ReceiptRenderer, print_receipt};
