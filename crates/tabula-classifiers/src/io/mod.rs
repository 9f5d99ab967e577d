pub mod csv_table;

pub use csv_table::{read_csv, read_csv_from_reader, write_csv, write_csv_to_writer, CsvReaderConfig};
