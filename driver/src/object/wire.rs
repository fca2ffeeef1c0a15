//! Property wire codec
//!
//! Values cross the host boundary as raw bytes in native byte order.
//! [`PropertyWriter`] fills a caller-supplied buffer (or only measures, when
//! the host asks for a size) and [`PropertyReader`] decodes set data and
//! qualifiers.
//!
//! Strings are a `u32` byte length followed by UTF-8; a length of
//! [`NULL_STRING`] stands for "no string".

use byteorder::{ByteOrder, NativeEndian};

use super::address::fourcc;
use crate::utils::error::{HardwareError, HardwareResult};

pub const U32_SIZE: usize = 4;
pub const F32_SIZE: usize = 4;
pub const F64_SIZE: usize = 8;
pub const VALUE_RANGE_SIZE: usize = 16;
pub const STREAM_FORMAT_SIZE: usize = 40;
pub const RANGED_FORMAT_SIZE: usize = STREAM_FORMAT_SIZE + VALUE_RANGE_SIZE;
pub const CHANNEL_LAYOUT_HEADER_SIZE: usize = 12;
pub const CHANNEL_DESCRIPTION_SIZE: usize = 20;

pub const NULL_STRING: u32 = u32::MAX;

pub const TRANSPORT_TYPE_VIRTUAL: u32 = fourcc(b"virt");
pub const TERMINAL_TYPE_MICROPHONE: u32 = fourcc(b"micr");
pub const TERMINAL_TYPE_SPEAKER: u32 = fourcc(b"spkr");

pub const FORMAT_LINEAR_PCM: u32 = fourcc(b"lpcm");
pub const FORMAT_FLAG_IS_FLOAT: u32 = 1 << 0;
pub const FORMAT_FLAG_IS_PACKED: u32 = 1 << 3;
pub const BITS_PER_SAMPLE: u32 = 32;

pub const CHANNEL_LAYOUT_USE_DESCRIPTIONS: u32 = 0;
pub const CHANNEL_LABEL_LEFT: u32 = 1;

/// Closed interval, used for sample-rate and decibel ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
}

/// Stream format description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub sample_rate: f64,
    pub format_id: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
}

impl StreamFormat {
    /// Packed interleaved 32-bit float, the only format the device speaks
    pub fn float32(sample_rate: f64, channels: u32) -> Self {
        let bytes_per_frame = channels * (BITS_PER_SAMPLE / 8);
        Self {
            sample_rate,
            format_id: FORMAT_LINEAR_PCM,
            format_flags: FORMAT_FLAG_IS_FLOAT | FORMAT_FLAG_IS_PACKED,
            bytes_per_packet: bytes_per_frame,
            frames_per_packet: 1,
            bytes_per_frame,
            channels_per_frame: channels,
            bits_per_channel: BITS_PER_SAMPLE,
        }
    }
}

/// Encoded size of an optional string
pub fn string_size(value: Option<&str>) -> usize {
    U32_SIZE + value.map_or(0, str::len)
}

enum Sink<'a> {
    Buffer(&'a mut [u8]),
    Measure,
}

/// Cursor over a property output buffer
pub struct PropertyWriter<'a> {
    sink: Sink<'a>,
    pos: usize,
}

impl<'a> PropertyWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            sink: Sink::Buffer(buf),
            pos: 0,
        }
    }

    /// A writer with unbounded capacity that only counts bytes
    pub fn measure() -> PropertyWriter<'static> {
        PropertyWriter {
            sink: Sink::Measure,
            pos: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        match &self.sink {
            Sink::Buffer(buf) => buf.len() - self.pos,
            Sink::Measure => usize::MAX - self.pos,
        }
    }

    fn put(&mut self, len: usize, encode: impl FnOnce(&mut [u8])) -> HardwareResult<()> {
        HardwareError::require_capacity(self.remaining(), len)?;
        if let Sink::Buffer(buf) = &mut self.sink {
            encode(&mut buf[self.pos..self.pos + len]);
        }
        self.pos += len;
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> HardwareResult<()> {
        self.put(U32_SIZE, |b| NativeEndian::write_u32(b, value))
    }

    pub fn put_bool(&mut self, value: bool) -> HardwareResult<()> {
        self.put_u32(u32::from(value))
    }

    pub fn put_f32(&mut self, value: f32) -> HardwareResult<()> {
        self.put(F32_SIZE, |b| NativeEndian::write_f32(b, value))
    }

    pub fn put_f64(&mut self, value: f64) -> HardwareResult<()> {
        self.put(F64_SIZE, |b| NativeEndian::write_f64(b, value))
    }

    pub fn put_range(&mut self, range: ValueRange) -> HardwareResult<()> {
        self.put_f64(range.min)?;
        self.put_f64(range.max)
    }

    pub fn put_format(&mut self, format: &StreamFormat) -> HardwareResult<()> {
        HardwareError::require_capacity(self.remaining(), STREAM_FORMAT_SIZE)?;
        self.put_f64(format.sample_rate)?;
        for field in [
            format.format_id,
            format.format_flags,
            format.bytes_per_packet,
            format.frames_per_packet,
            format.bytes_per_frame,
            format.channels_per_frame,
            format.bits_per_channel,
            0,
        ] {
            self.put_u32(field)?;
        }
        Ok(())
    }

    pub fn put_str(&mut self, value: Option<&str>) -> HardwareResult<()> {
        HardwareError::require_capacity(self.remaining(), string_size(value))?;
        match value {
            Some(s) => {
                let len = u32::try_from(s.len())
                    .map_err(|_| HardwareError::illegal("string too long"))?;
                self.put_u32(len)?;
                self.put(s.len(), |b| b.copy_from_slice(s.as_bytes()))
            }
            None => self.put_u32(NULL_STRING),
        }
    }

    /// Write as many whole items as fit, returning how many were written
    pub fn put_list<T>(
        &mut self,
        items: &[T],
        item_size: usize,
        mut encode: impl FnMut(&mut Self, &T) -> HardwareResult<()>,
    ) -> HardwareResult<usize> {
        let count = items.len().min(self.remaining() / item_size);
        for item in &items[..count] {
            encode(self, item)?;
        }
        Ok(count)
    }

    pub fn put_ids(&mut self, ids: &[u32]) -> HardwareResult<usize> {
        self.put_list(ids, U32_SIZE, |w, id| w.put_u32(*id))
    }

    /// Channel layout with one description per channel, labelled from Left
    pub fn put_channel_layout(&mut self, channels: u32) -> HardwareResult<()> {
        let size = CHANNEL_LAYOUT_HEADER_SIZE + channels as usize * CHANNEL_DESCRIPTION_SIZE;
        HardwareError::require_capacity(self.remaining(), size)?;

        self.put_u32(CHANNEL_LAYOUT_USE_DESCRIPTIONS)?;
        self.put_u32(0)?;
        self.put_u32(channels)?;
        for channel in 0..channels {
            self.put_u32(CHANNEL_LABEL_LEFT + channel)?;
            self.put_u32(0)?;
            for _ in 0..3 {
                self.put_f32(0.0)?;
            }
        }
        Ok(())
    }

    /// Read the f32 at the cursor without advancing; in-place conversions
    /// use the output buffer as their input
    pub fn peek_f32(&self) -> HardwareResult<f32> {
        HardwareError::require_capacity(self.remaining(), F32_SIZE)?;
        Ok(match &self.sink {
            Sink::Buffer(buf) => NativeEndian::read_f32(&buf[self.pos..self.pos + F32_SIZE]),
            Sink::Measure => 0.0,
        })
    }
}

/// Cursor over set data or a qualifier
pub struct PropertyReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PropertyReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> HardwareResult<&'a [u8]> {
        HardwareError::require_capacity(self.buf.len() - self.pos, len)?;
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn u32(&mut self) -> HardwareResult<u32> {
        Ok(NativeEndian::read_u32(self.take(U32_SIZE)?))
    }

    pub fn f32(&mut self) -> HardwareResult<f32> {
        Ok(NativeEndian::read_f32(self.take(F32_SIZE)?))
    }

    pub fn f64(&mut self) -> HardwareResult<f64> {
        Ok(NativeEndian::read_f64(self.take(F64_SIZE)?))
    }

    pub fn format(&mut self) -> HardwareResult<StreamFormat> {
        let sample_rate = self.f64()?;
        let format = StreamFormat {
            sample_rate,
            format_id: self.u32()?,
            format_flags: self.u32()?,
            bytes_per_packet: self.u32()?,
            frames_per_packet: self.u32()?,
            bytes_per_frame: self.u32()?,
            channels_per_frame: self.u32()?,
            bits_per_channel: self.u32()?,
        };
        // reserved
        self.u32()?;
        Ok(format)
    }

    pub fn string(&mut self) -> HardwareResult<Option<String>> {
        let len = self.u32()?;
        if len == NULL_STRING {
            return Ok(None);
        }
        let bytes = self.take(len as usize)?;
        std::str::from_utf8(bytes)
            .map(|s| Some(s.to_owned()))
            .map_err(|e| HardwareError::illegal(format!("string is not UTF-8: {e}")))
    }
}

/// Encode a string the way [`PropertyReader::string`] expects it
pub fn encode_str(value: Option<&str>) -> Vec<u8> {
    let mut buf = vec![0u8; string_size(value)];
    let mut writer = PropertyWriter::new(&mut buf);
    // sized exactly above
    let _ = writer.put_str(value);
    buf
}
