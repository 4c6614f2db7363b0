use std::io::Read;

/// Big-endian bit and byte reader over any byte source.
///
/// Used both for walking PNG chunk streams and for unpacking sub-byte
/// samples, which PNG stores most significant bits first.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    reader: R,
    buffer: u32,
    bits_in_buffer: u8,
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        BitReader {
            reader,
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Reads a single bit from the bitstream.
    ///
    /// # Returns
    /// - `true` if the bit is 1, `false` if the bit is 0
    /// - `std::io::Error` if an I/O error occurs
    pub fn read_bit(&mut self) -> Result<bool, std::io::Error> {
        if self.bits_in_buffer == 0 {
            let mut byte = [0u8; 1];
            self.reader.read_exact(&mut byte)?;
            self.buffer = u32::from(byte[0]);
            self.bits_in_buffer = 8;
        }

        self.bits_in_buffer -= 1;
        Ok(((self.buffer >> self.bits_in_buffer) & 1) != 0)
    }

    /// Reads `n` bits from the bitstream, most significant bit first.
    ///
    /// # Parameters
    /// - `n`: The number of bits to read
    ///
    /// # Returns
    /// - The value of the bits read
    /// - `std::io::Error` if an I/O error occurs
    pub fn read_bits(&mut self, n: u8) -> Result<u32, std::io::Error> {
        let mut result = 0;
        for _ in 0..n {
            result = (result << 1) | (self.read_bit()? as u32);
        }
        Ok(result)
    }

    /// Reads a single byte from the bitstream.
    pub fn read_u8(&mut self) -> Result<u8, std::io::Error> {
        if self.bits_in_buffer == 0 {
            let mut byte = [0u8; 1];
            self.reader.read_exact(&mut byte)?;
            return Ok(byte[0]);
        }

        self.read_bits(8).map(|b| b as u8)
    }

    /// Reads a single big-endian 32-bit value from the bitstream.
    pub fn read_u32(&mut self) -> Result<u32, std::io::Error> {
        let b0 = self.read_u8()? as u32;
        let b1 = self.read_u8()? as u32;
        let b2 = self.read_u8()? as u32;
        let b3 = self.read_u8()? as u32;
        Ok((b0 << 24) | (b1 << 16) | (b2 << 8) | b3)
    }

    /// Fills `buf` completely, falling back to bitwise reads when unaligned.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), std::io::Error> {
        if self.bits_in_buffer == 0 {
            return self.reader.read_exact(buf);
        }

        for byte in buf.iter_mut() {
            *byte = self.read_u8()?;
        }

        Ok(())
    }
}
