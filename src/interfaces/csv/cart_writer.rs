use crate::domain::cart::Cart;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct CartRow<'a> {
    cart_id: String,
    product_id: &'a str,
    name: &'a str,
    price: Decimal,
    quantity: u32,
    line_total: Decimal,
}

/// Writes a cart listing as CSV, one row per line entry in display order.
pub struct CartWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CartWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_cart(&mut self, cart: &Cart) -> Result<()> {
        if cart.is_empty() {
            self.writer.write_record([
                "cart_id",
                "product_id",
                "name",
                "price",
                "quantity",
                "line_total",
            ])?;
        }
        for item in cart.items() {
            self.writer.serialize(CartRow {
                cart_id: item.cart_id.to_string(),
                product_id: &item.product_id,
                name: &item.name,
                price: item.price.value().normalize(),
                quantity: item.quantity,
                line_total: item.line_total().normalize(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
