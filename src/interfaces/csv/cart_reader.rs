use crate::domain::cart::{Price, Product};
use crate::error::{Result, StorefrontError};
use serde::Deserialize;
use std::io::Read;

/// One product line of a bulk cart import.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub store: Option<String>,
}

impl CartLine {
    pub fn into_product(self) -> (Product, u32) {
        let mut product = Product::new(self.product_id, self.name, self.price);
        product.store = self.store.filter(|s| !s.is_empty());
        (product, self.quantity)
    }
}

/// Reads product lines from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and tolerating a missing trailing
/// `store` column.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    /// Creates a new `CartReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes lines; malformed rows yield an error and
    /// the iterator moves on.
    pub fn lines(self) -> impl Iterator<Item = Result<CartLine>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(StorefrontError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "product_id, name, price, quantity, store\np1, Mug, 12.50, 2, Acme\np2, Tea, 4, 1";
        let reader = CartReader::new(data.as_bytes());
        let results: Vec<Result<CartLine>> = reader.lines().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.product_id, "p1");
        assert_eq!(first.price, Price::new(dec!(12.50)).unwrap());
        assert_eq!(first.store.as_deref(), Some("Acme"));
        assert!(results[1].as_ref().unwrap().store.is_none());
    }

    #[test]
    fn test_reader_malformed_lines() {
        let data = "product_id, name, price, quantity\np1, Mug, -3, 1\np2, Tea, 4, lots\np3, Pen, 1, 1";
        let reader = CartReader::new(data.as_bytes());
        let results: Vec<Result<CartLine>> = reader.lines().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
