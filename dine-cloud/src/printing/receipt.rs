//! Customer receipt renderer
//!
//! Renders an order into ESC/POS bytes for the thermal printer behind the
//! print bridge.

use receipt_printer::{EscPosBuilder, Printer};
use rust_decimal::Decimal;
use shared::models::{Order, PrintResult, Restaurant};
use shared::order::OrderStatus;

/// Receipt renderer
pub struct ReceiptRenderer {
    width: usize,
}

impl ReceiptRenderer {
    /// Create a new renderer with specified paper width
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Render an order to ESC/POS bytes
    pub fn render(&self, restaurant: &Restaurant, order: &Order) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);

        self.render_header(&mut b, restaurant, order);
        self.render_items(&mut b, order);
        self.render_totals(&mut b, restaurant, order);
        self.render_footer(&mut b, order);

        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder, restaurant: &Restaurant, order: &Order) {
        b.center();
        b.double_size();
        b.bold();
        b.line(&restaurant.name);
        b.bold_off();
        b.reset_size();

        for extra in [&restaurant.address, &restaurant.phone].into_iter().flatten() {
            if !extra.is_empty() {
                b.line(extra);
            }
        }

        b.left();
        b.sep_double();
        b.line_lr("Table", &order.table_name);
        b.line_lr("Order", &format!("#{}", order.id));
        b.line_lr("Time", &format_timestamp(order.created_at));
        b.sep_single();
    }

    fn render_items(&self, b: &mut EscPosBuilder, order: &Order) {
        for item in &order.items {
            let left = format!("{} x {}", item.quantity, item.name);
            b.line_lr(&left, &format_money(item.line_total()));

            if let Some(note) = item.note.as_deref().filter(|n| !n.is_empty()) {
                b.wrapped(&format!("* {note}"), 2);
            }
        }
        b.sep_single();
    }

    fn render_totals(&self, b: &mut EscPosBuilder, restaurant: &Restaurant, order: &Order) {
        b.bold();
        b.double_height();
        b.line_lr(
            "TOTAL",
            &format!("{} {}", format_money(order.total), restaurant.currency),
        );
        b.reset_size();
        b.bold_off();

        if let Some(note) = order.note.as_deref().filter(|n| !n.is_empty()) {
            b.newline();
            b.wrapped(&format!("Note: {note}"), 0);
        }
    }

    fn render_footer(&self, b: &mut EscPosBuilder, order: &Order) {
        b.newline();
        b.center();
        b.bold();
        if order.status == OrderStatus::Canceled {
            b.line("*** CANCELED ***");
        } else if order.paid {
            b.line("PAID");
        } else {
            b.line("NOT PAID");
        }
        b.bold_off();
        b.line("Thank you!");
        b.left();

        b.cut_feed(3);
    }
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        Self::new(48)
    }
}

fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}

/// Send a rendered receipt to the printer.
///
/// Printing is best effort: failures are logged and reported as a warning,
/// never as an error.
pub async fn print_receipt<P: Printer>(printer: &P, order_id: i64, data: &[u8]) -> PrintResult {
    match printer.print(data).await {
        Ok(()) => {
            tracing::info!(order_id, bytes = data.len(), "Receipt printed");
            PrintResult {
                printed: true,
                warning: None,
            }
        }
        Err(e) => {
            tracing::warn!(order_id, error = %e, "Receipt printing failed");
            let warning = if e.is_unavailable() {
                format!("Print bridge unavailable: {e}")
            } else {
                format!("Print bridge rejected the receipt: {e}")
            };
            PrintResult {
                printed: false,
                warning: Some(warning),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_printer::{PrintError, encode_cp1252};
    use shared::models::OrderItem;
    use shared::order::OrderSource;
    use std::sync::Mutex;

    fn restaurant() -> Restaurant {
        Restaurant {
            id: 1,
            name: "Bistro Café".into(),
            description: None,
            address: Some("12 Rue des Lilas".into()),
            phone: None,
            logo_url: None,
            currency: "EUR".into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn order() -> Order {
        Order {
            id: 9001,
            restaurant_id: 1,
            table_id: Some(3),
            table_name: "Terrace 2".into(),
            source: OrderSource::Customer,
            status: OrderStatus::Preparing,
            cancel_reason: None,
            paid: false,
            is_locked: false,
            note: Some("Birthday".into()),
            total: Decimal::new(1250, 2),
            created_at: 1_704_067_200_000,
            updated_at: 1_704_067_200_000,
            paid_at: None,
            items: vec![
                OrderItem {
                    id: 1,
                    order_id: 9001,
                    menu_item_id: Some(5),
                    name: "Crème brûlée".into(),
                    price: Decimal::new(450, 2),
                    quantity: 2,
                    note: Some("no sugar".into()),
                    position: 0,
                },
                OrderItem {
                    id: 2,
                    order_id: 9001,
                    menu_item_id: Some(6),
                    name: "Espresso".into(),
                    price: Decimal::new(350, 2),
                    quantity: 1,
                    note: None,
                    position: 1,
                },
            ],
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        let needle = encode_cp1252(needle);
        haystack.windows(needle.len()).any(|w| w == needle.as_slice())
    }

    #[test]
    fn receipt_has_header_items_and_total() {
        let data = ReceiptRenderer::new(48).render(&restaurant(), &order());

        assert!(contains(&data, "Bistro Café"));
        assert!(contains(&data, "12 Rue des Lilas"));
        assert!(contains(&data, "Terrace 2"));
        assert!(contains(&data, "#9001"));
        assert!(contains(&data, "2024-01-01 00:00 UTC"));
        assert!(contains(&data, "2 x Crème brûlée"));
        assert!(contains(&data, "9.00"));
        assert!(contains(&data, "* no sugar"));
        assert!(contains(&data, "12.50 EUR"));
        assert!(contains(&data, "Note: Birthday"));
        assert!(contains(&data, "NOT PAID"));
    }

    #[test]
    fn receipt_ends_with_cut() {
        let data = ReceiptRenderer::default().render(&restaurant(), &order());
        // GS V 66 n
        assert_eq!(&data[data.len() - 4..data.len() - 1], &[0x1D, 0x56, 0x42]);
    }

    #[test]
    fn paid_and_canceled_markers() {
        let mut paid = order();
        paid.paid = true;
        let data = ReceiptRenderer::default().render(&restaurant(), &paid);
        assert!(contains(&data, "PAID"));
        assert!(!contains(&data, "NOT PAID"));

        let mut canceled = order();
        canceled.status = OrderStatus::Canceled;
        let data = ReceiptRenderer::default().render(&restaurant(), &canceled);
        assert!(contains(&data, "*** CANCELED ***"));
    }

    struct FakePrinter {
        fail: Option<fn() -> PrintError>,
        jobs: Mutex<Vec<Vec<u8>>>,
    }

    impl Printer for FakePrinter {
        async fn print(&self, data: &[u8]) -> receipt_printer::PrintResult<()> {
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            self.jobs.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn is_online(&self) -> bool {
            self.fail.is_none()
        }
    }

    #[tokio::test]
    async fn print_success_reports_printed() {
        let printer = FakePrinter {
            fail: None,
            jobs: Mutex::new(vec![]),
        };
        let result = print_receipt(&printer, 1, b"receipt").await;
        assert!(result.printed);
        assert!(result.warning.is_none());
        assert_eq!(printer.jobs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn print_failure_becomes_warning() {
        let printer = FakePrinter {
            fail: Some(|| PrintError::Connection("refused".into())),
            jobs: Mutex::new(vec![]),
        };
        let result = print_receipt(&printer, 1, b"receipt").await;
        assert!(!result.printed);
        assert!(result.warning.unwrap().contains("unavailable"));

        let printer = FakePrinter {
            fail: Some(|| PrintError::Rejected {
                status: 500,
                message: "paper out".into(),
            }),
            jobs: Mutex::new(vec![]),
        };
        let result = print_receipt(&printer, 1, b"receipt").await;
        assert!(result.warning.unwrap().contains("rejected"));
    }
}
