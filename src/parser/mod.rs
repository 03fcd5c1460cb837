//! Decoders for the envelope format and for encoded frame payloads.
//!
//! Bridges use [`CommandParser`] to read what the transports send; the payload
//! functions turn chunk and sequence bytes back into quantized frames.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

use crate::color::{QuantizedColor, Rgb15, Rgb16, Rgb6};
use crate::host::wire::{
    Command, API_VERSION, TAG_DEVICE, TAG_FRAME_CHUNK, TAG_LIGHT_CONTROL, TAG_RECOVER,
    TAG_START_SEQUENCE,
};
use crate::host::{GroupId, PlayMode};
use crate::sequence::ProtocolVersion;

pub type ParserResult<T> = Result<T, ParserError>;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("invalid envelope API version {0}")]
    InvalidApiVersion(u8),
    #[error("unknown command tag {0}")]
    UnknownCommand(u8),
    #[error("unknown play mode {0}")]
    InvalidPlayMode(u8),
    #[error("no frame layout for protocol version {0}")]
    UnknownFrameVersion(u16),
    #[error("{0} unexpected bytes after the last frame")]
    TrailingBytes(usize),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Command buffer and envelope parser.
pub struct CommandParser {
    /// Commands parsed so far.
    pub cmds: Vec<Command>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandParser {
    pub fn new() -> CommandParser {
        CommandParser { cmds: vec![] }
    }

    pub fn read_from(&mut self, buf: &mut dyn Read) -> ParserResult<()> {
        // Clear temp command buffer.
        self.cmds.clear();
        // Check the header.
        self.read_header(buf)?;
        while self.read_cmd(buf)? {}
        Ok(())
    }

    fn read_header(&mut self, buf: &mut dyn Read) -> ParserResult<()> {
        match buf.read_u8()? {
            API_VERSION => Ok(()),
            ver => Err(ParserError::InvalidApiVersion(ver)),
        }
    }

    /// Read the next command, if there is any data left. Returns Ok(false) on end-of-data.
    fn read_cmd(&mut self, buf: &mut dyn Read) -> ParserResult<bool> {
        let tag = match buf.read_u8() {
            Ok(tag) => tag,
            // Running out of data right before a command is ok.
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        let cmd = match tag {
            TAG_DEVICE => read_cmd_device(buf)?,
            TAG_START_SEQUENCE => read_cmd_start_sequence(buf)?,
            TAG_FRAME_CHUNK => read_cmd_frame_chunk(buf)?,
            TAG_LIGHT_CONTROL => {
                let group = GroupId(buf.read_u8()?);
                let len = usize::from(buf.read_u16::<LittleEndian>()?);
                Command::LightControl {
                    group,
                    lights: read_bytes(buf, len)?,
                }
            }
            TAG_RECOVER => Command::Recover {
                feature_id: buf.read_u32::<LittleEndian>()?,
            },
            tag => return Err(ParserError::UnknownCommand(tag)),
        };
        self.cmds.push(cmd);
        Ok(true)
    }
}

fn read_cmd_device(buf: &mut dyn Read) -> ParserResult<Command> {
    let mut tmp = vec![];
    // Read bytes until we hit a zero
    loop {
        let byte = buf.read_u8()?;
        if byte == 0 {
            break;
        }
        tmp.push(byte);
    }
    let name = String::from_utf8_lossy(&tmp).to_string();
    Ok(Command::Device { name })
}

fn read_cmd_start_sequence(buf: &mut dyn Read) -> ParserResult<Command> {
    let group = GroupId(buf.read_u8()?);
    let mode = read_play_mode(buf)?;
    let sequence_id = buf.read_u16::<LittleEndian>()?;
    let len = buf.read_u32::<LittleEndian>()? as usize;
    Ok(Command::StartSequence {
        group,
        mode,
        sequence_id,
        data: read_bytes(buf, len)?,
    })
}

fn read_cmd_frame_chunk(buf: &mut dyn Read) -> ParserResult<Command> {
    let group = GroupId(buf.read_u8()?);
    let mode = read_play_mode(buf)?;
    let chunk_id = buf.read_u8()?;
    let frame_count = buf.read_u16::<LittleEndian>()?;
    let len = usize::from(buf.read_u16::<LittleEndian>()?);
    Ok(Command::FrameChunk {
        group,
        mode,
        chunk_id,
        frame_count,
        payload: read_bytes(buf, len)?,
    })
}

fn read_play_mode(buf: &mut dyn Read) -> ParserResult<PlayMode> {
    let byte = buf.read_u8()?;
    PlayMode::from_byte(byte).ok_or(ParserError::InvalidPlayMode(byte))
}

fn read_bytes(buf: &mut dyn Read, len: usize) -> ParserResult<Vec<u8>> {
    // Length comes from the wire; only allocate what arrives.
    let mut data = vec![];
    buf.take(len as u64).read_to_end(&mut data)?;
    if data.len() < len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(data)
}

/// A frame as it arrives at the hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub duration_ms: u16,
    pub lights: Vec<QuantizedColor>,
}

/// A start-sequence payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSequence {
    pub version: u16,
    pub id: u16,
    pub segments: Vec<Vec<DecodedFrame>>,
}

/// Decode `frame_count` frames from a chunk payload.
pub fn parse_frames(
    version: ProtocolVersion,
    frame_count: u16,
    payload: &[u8],
) -> ParserResult<Vec<DecodedFrame>> {
    let mut reader = payload;
    let frames = read_frames(version, frame_count, &mut reader)?;
    if !reader.is_empty() {
        return Err(ParserError::TrailingBytes(reader.len()));
    }
    Ok(frames)
}

/// Decode a whole start-sequence payload.
pub fn parse_sequence(data: &[u8]) -> ParserResult<DecodedSequence> {
    let mut reader = data;
    let number = reader.read_u16::<LittleEndian>()?;
    let version =
        ProtocolVersion::from_number(number).ok_or(ParserError::UnknownFrameVersion(number))?;
    let id = reader.read_u16::<LittleEndian>()?;
    let segment_count = reader.read_u16::<LittleEndian>()?;
    let mut segments = Vec::with_capacity(usize::from(segment_count));
    for _ in 0..segment_count {
        let frame_count = reader.read_u16::<LittleEndian>()?;
        segments.push(read_frames(version, frame_count, &mut reader)?);
    }
    if !reader.is_empty() {
        return Err(ParserError::TrailingBytes(reader.len()));
    }
    Ok(DecodedSequence {
        version: number,
        id,
        segments,
    })
}

fn read_frames(
    version: ProtocolVersion,
    frame_count: u16,
    buf: &mut &[u8],
) -> ParserResult<Vec<DecodedFrame>> {
    let mut frames = Vec::with_capacity(usize::from(frame_count));
    for _ in 0..frame_count {
        let duration_ms = buf.read_u16::<LittleEndian>()?;
        let count = match version {
            ProtocolVersion::V1 => u16::from(buf.read_u8()?),
            ProtocolVersion::V2 | ProtocolVersion::V3 => buf.read_u16::<LittleEndian>()?,
        };
        let mut lights = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            lights.push(match version {
                ProtocolVersion::V1 => QuantizedColor::Rgb6(Rgb6::from_byte(buf.read_u8()?)),
                ProtocolVersion::V2 => {
                    QuantizedColor::Rgb15(Rgb15::from_word(buf.read_u16::<LittleEndian>()?))
                }
                ProtocolVersion::V3 => {
                    QuantizedColor::Rgb16(Rgb16::from_word(buf.read_u16::<LittleEndian>()?))
                }
            });
        }
        frames.push(DecodedFrame {
            duration_ms,
            lights,
        });
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::host::wire::Envelope;
    use crate::sequence::{Frame, LightSequence};

    #[test]
    fn test_parse_envelope_commands() {
        let bytes = Envelope::new("topper")
            .and_then(|e| e.start_sequence(GroupId(0), PlayMode::Looped, 5, &[9, 8]))
            .and_then(|e| e.light_control(GroupId(1), &[1, 2]))
            .unwrap()
            .into_bytes();

        let mut parser = CommandParser::new();
        parser.read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(
            parser.cmds,
            vec![
                Command::Device {
                    name: "topper".to_string()
                },
                Command::StartSequence {
                    group: GroupId(0),
                    mode: PlayMode::Looped,
                    sequence_id: 5,
                    data: vec![9, 8],
                },
                Command::LightControl {
                    group: GroupId(1),
                    lights: vec![1, 2],
                },
            ]
        );
    }

    #[test]
    fn test_rejects_bad_header_and_tags() {
        let mut parser = CommandParser::new();
        assert!(matches!(
            parser.read_from(&mut &[1u8][..]),
            Err(ParserError::InvalidApiVersion(1))
        ));
        assert!(matches!(
            parser.read_from(&mut &[API_VERSION, 0x7f][..]),
            Err(ParserError::UnknownCommand(0x7f))
        ));
        // Length field far larger than the data behind it.
        let mut bytes = vec![API_VERSION, TAG_START_SEQUENCE, 0, 0, 1, 0];
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[1, 2]);
        assert!(matches!(
            parser.read_from(&mut bytes.as_slice()),
            Err(ParserError::IoError(_))
        ));
        // Truncated in the middle of a command.
        assert!(matches!(
            parser.read_from(&mut &[API_VERSION, TAG_RECOVER, 1][..]),
            Err(ParserError::IoError(_))
        ));
    }

    #[test]
    fn test_parse_frames_matches_quantizer() {
        let frame = Frame::new(25, vec![Color::rgb(255, 128, 0), Color::new(40, 40, 40, 128)]);
        let mut payload = vec![];
        frame.encode_into(ProtocolVersion::V3, &mut payload).unwrap();
        frame.encode_into(ProtocolVersion::V3, &mut payload).unwrap();

        let frames = parse_frames(ProtocolVersion::V3, 2, &payload).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].duration_ms, 25);
        assert_eq!(
            frames[1].lights,
            vec![
                QuantizedColor::Rgb16(Color::rgb(255, 128, 0).to_rgb16().unwrap()),
                QuantizedColor::Rgb16(Color::new(40, 40, 40, 128).to_rgb16().unwrap()),
            ]
        );

        assert!(matches!(
            parse_frames(ProtocolVersion::V3, 1, &payload),
            Err(ParserError::TrailingBytes(_))
        ));
    }

    #[test]
    fn test_parse_sequence() {
        let sequence = LightSequence::builder(77, 1)
            .segment(vec![Frame::new(10, vec![Color::rgb(255, 255, 255)]); 2])
            .segment(vec![Frame::new(20, vec![])])
            .build();
        let decoded = parse_sequence(&sequence.encode().unwrap()).unwrap();
        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.id, 77);
        assert_eq!(decoded.segments.len(), 2);
        assert_eq!(decoded.segments[0][1].lights[0].channels(), (2, 2, 2));
        assert_eq!(decoded.segments[1][0].duration_ms, 20);
    }
}
