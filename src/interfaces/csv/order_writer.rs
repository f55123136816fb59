use crate::domain::order::Order;
use crate::error::Result;
use std::io::Write;

/// Writes orders as CSV for back-office use:
/// `id,title,total,status,payment_key,created_at`.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_orders(&mut self, orders: &[Order]) -> Result<()> {
        self.writer
            .write_record(["id", "title", "total", "status", "payment_key", "created_at"])?;
        for order in orders {
            self.writer.write_record([
                order.id.as_str(),
                order.title.as_str(),
                &order.total.to_string(),
                order.status.label(),
                order.payment_key.as_deref().unwrap_or(""),
                &order.created_at.to_rfc3339(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
