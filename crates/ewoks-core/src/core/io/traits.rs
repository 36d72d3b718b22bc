use crate::core::models::registry::Registry;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing protein population file formats.
///
/// Implementors handle format-specific parsing and serialization; the path helpers open
/// buffered files and delegate.
pub trait PopulationFile {
    /// Format-specific options controlling how records are loaded.
    type Options: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads records from `reader` and registers them into an existing `registry`.
    ///
    /// # Return
    ///
    /// Returns the number of records loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or a record cannot be registered.
    fn read_into(
        reader: &mut impl BufRead,
        registry: &mut Registry,
        options: &Self::Options,
    ) -> Result<usize, Self::Error>;

    /// Writes every entity of `registry` to `writer`.
    fn write_to(registry: &Registry, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a new population from a buffered reader.
    fn read_from(
        reader: &mut impl BufRead,
        options: &Self::Options,
    ) -> Result<Registry, Self::Error> {
        let mut registry = Registry::new();
        Self::read_into(reader, &mut registry, options)?;
        Ok(registry)
    }

    /// Reads a new population from a file path.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
        options: &Self::Options,
    ) -> Result<Registry, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, options)
    }

    /// Writes a population to a file path.
    fn write_to_path<P: AsRef<Path>>(registry: &Registry, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(registry, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
