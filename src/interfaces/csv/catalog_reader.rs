use crate::domain::product::Product;
use crate::error::{Result, StorefrontError};
use std::io::Read;

/// Reads catalog products from a CSV source
/// (`id,name,description,price,image_url,category`).
///
/// Wraps `csv::Reader` and yields `Result<Product>` lazily, so large seed
/// files stream without loading everything into memory. Whitespace is
/// trimmed and record lengths are flexible.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    /// Creates a new `CatalogReader` from any `Read` source (e.g. File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
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
        let data = "id, name, description, price, image_url, category\n\
                    p1, 무지 토트백, 튼튼한 가방, 49.99, , bags\n\
                    p2, 숄더 스트랩, , 10.00, https://img.example.com/strap.jpg, accessories";
        let reader = CatalogReader::new(data.as_bytes());
        let results: Vec<Result<Product>> = reader.products().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.id, "p1");
        assert_eq!(first.price, dec!(49.99));
        assert!(first.image_url.is_none());
        let second = results[1].as_ref().unwrap();
        assert_eq!(
            second.image_url.as_deref(),
            Some("https://img.example.com/strap.jpg")
        );
    }

    #[test]
    fn test_reader_malformed_price() {
        let data = "id, name, description, price, image_url, category\n\
                    p1, 무지 토트백, , not-a-number, , bags";
        let reader = CatalogReader::new(data.as_bytes());
        let results: Vec<Result<Product>> = reader.products().collect();

        assert!(results[0].is_err());
    }
}
