//! Binary serialization for genomes
//!
//! `.orgb` files store instruction names, not table ids, so a genome saved
//! under one table loads under any table that knows the same names.
//!
//! ## Binary Format
//!
//! ```text
//! HEADER
//! ├── Magic:     "ORGN" (4 bytes)
//! └── Version:   u16 (format version)
//!
//! NAMES
//! ├── Count:     u16
//! └── For each name:
//!     ├── Len:   u8
//!     └── Name:  [u8; len] (UTF-8)
//!
//! POSITIONS
//! ├── Count:     u32
//! └── Index:     [u8; count] (into NAMES)
//! ```
//!
//! All integers are little-endian. Modifiers are not stored; they are
//! re-derived when the position stream is decoded.

use super::{Genome, InstructionTable, Opcode, GENOME_MAGIC, GENOME_VERSION};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Bytes before the name table
pub const HEADER_SIZE: usize = 6;

/// Cursor over a byte slice that reports where it ran out.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.offset + n;
        if end > self.data.len() {
            anyhow::bail!(
                "Unexpected end of data reading {} at offset {} (need {} bytes, have {})",
                what,
                self.offset,
                n,
                self.data.len() - self.offset
            );
        }
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2, what)?.try_into()?))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4, what)?.try_into()?))
    }
}

/// Serialize a genome to binary
pub fn serialize(genome: &Genome, table: &InstructionTable) -> Result<Vec<u8>> {
    // Distinct names in first-use order
    let mut names: Vec<&str> = Vec::new();
    let mut index_of: HashMap<Opcode, u8> = HashMap::new();
    let mut positions = Vec::with_capacity(genome.len());

    for inst in genome {
        let index = match index_of.get(&inst.opcode) {
            Some(&i) => i,
            None => {
                let meta = table
                    .get(inst.opcode)
                    .with_context(|| format!("Opcode {} not in table", inst.opcode))?;
                let i = u8::try_from(names.len()).context("More than 256 distinct instructions")?;
                names.push(meta.name.as_str());
                index_of.insert(inst.opcode, i);
                i
            }
        };
        positions.push(index);
    }

    let mut output = Vec::new();
    output.extend_from_slice(&GENOME_MAGIC);
    output.extend_from_slice(&GENOME_VERSION.to_le_bytes());

    output.extend_from_slice(&(names.len() as u16).to_le_bytes());
    for name in &names {
        let len = u8::try_from(name.len())
            .with_context(|| format!("Instruction name too long: {}", name))?;
        output.push(len);
        output.extend_from_slice(name.as_bytes());
    }

    let count = u32::try_from(positions.len()).context("Genome too long")?;
    output.extend_from_slice(&count.to_le_bytes());
    output.extend(positions);

    Ok(output)
}

/// Deserialize a binary genome against `table`
pub fn deserialize(data: &[u8], table: &InstructionTable) -> Result<Genome> {
    let mut reader = Reader { data, offset: 0 };

    let magic = reader.take(4, "magic")?;
    if magic != GENOME_MAGIC {
        anyhow::bail!(
            "Invalid magic: expected ORGN, got {:?}",
            String::from_utf8_lossy(magic)
        );
    }
    let version = reader.u16("version")?;
    if version != GENOME_VERSION {
        anyhow::bail!("Unsupported genome format version {}", version);
    }

    let name_count = reader.u16("name count")? as usize;
    let mut opcodes_by_index = Vec::with_capacity(name_count);
    for i in 0..name_count {
        let len = reader.u8("name length")? as usize;
        let name = std::str::from_utf8(reader.take(len, "name")?)
            .with_context(|| format!("Name {} is not UTF-8", i))?;
        let opcode = table
            .lookup(name)
            .with_context(|| format!("Name {} not in table", i))?;
        opcodes_by_index.push(opcode);
    }

    let count = reader.u32("position count")? as usize;
    let indices = reader.take(count, "positions")?;
    let opcodes = indices
        .iter()
        .enumerate()
        .map(|(pos, &i)| {
            opcodes_by_index
                .get(i as usize)
                .copied()
                .with_context(|| format!("Position {} refers to missing name {}", pos, i))
        })
        .collect::<Result<Vec<_>>>()?;

    if reader.offset != data.len() {
        anyhow::bail!("{} trailing bytes after genome", data.len() - reader.offset);
    }

    table.decode(&opcodes).context("Failed to decode genome")
}

/// Save genome to binary file
pub fn save_to_file(
    genome: &Genome,
    table: &InstructionTable,
    path: impl AsRef<std::path::Path>,
) -> Result<()> {
    let binary = serialize(genome, table)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(&binary)?;
    Ok(())
}

/// Load genome from binary file
pub fn load_from_file(path: impl AsRef<std::path::Path>, table: &InstructionTable) -> Result<Genome> {
    let mut file = std::fs::File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    deserialize(&data, table)
}
