use std::fs::File;
use std::io::Error;
use std::path::Path;

/// Writes a catalog seed CSV: one `(id, name, price)` triple per row.
pub fn write_catalog_csv(path: &Path, rows: &[(&str, &str, &str)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["id", "name", "description", "price", "image_url", "category"])?;
    for (id, name, price) in rows {
        wtr.write_record([*id, *name, "", *price, "", "demo"])?;
    }

    wtr.flush()?;
    Ok(())
}
