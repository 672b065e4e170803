//! Message encoding and decoding for network transport.
//!
//! # Wire Format
//!
//! Every connection carries exactly one frame:
//!
//! ```text
//! [12-byte NUL-padded ASCII command][SBOR payload]
//! ```
//!
//! # Command-Based Type Dispatch
//!
//! The payload type is determined by the command tag, not by a field in the
//! payload. An unknown command is rejected before the payload is touched.

use std::fmt::Debug;
use tokoin_core::{Event, OutboundMessage};
use tokoin_messages::{
    AddrGossip, BlockResponse, Command, GetBlocksRequest, GetDataRequest, GetProposalRequest,
    InventoryGossip, PrecommitGossip, PrevoteGossip, ProposalGossip, ProposeBlockGossip,
    TransactionGossip, VersionAnnouncement, COMMAND_LENGTH,
};
use thiserror::Error;

/// Largest frame accepted from a peer (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Message too short: {0} bytes")]
    MessageTooShort(usize),

    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("SBOR decode error: {0}")]
    SborDecode(String),

    #[error("SBOR encode error: {0}")]
    SborEncode(String),

    #[error("Frame of {size} bytes exceeds limit of {limit}")]
    FrameTooLarge { size: usize, limit: usize },
}

fn encode_error(e: impl Debug) -> CodecError {
    CodecError::SborEncode(format!("{:?}", e))
}

fn decode_error(e: impl Debug) -> CodecError {
    CodecError::SborDecode(format!("{:?}", e))
}

/// Encode an outbound message to wire format.
///
/// Writes the command tag then the SBOR-encoded payload.
pub fn encode_message(message: &OutboundMessage) -> Result<Vec<u8>, CodecError> {
    let payload = match message {
        OutboundMessage::Addr(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::Version(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::GetBlocks(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::Inventory(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::GetData(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::Block(m) => sbor::basic_encode(m.as_ref()).map_err(encode_error)?,
        OutboundMessage::Transaction(m) => {
            sbor::basic_encode(m.as_ref()).map_err(encode_error)?
        }
        OutboundMessage::ProposeBlock(m) => {
            sbor::basic_encode(m.as_ref()).map_err(encode_error)?
        }
        OutboundMessage::GetProposal(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::Proposal(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::Prevote(m) => sbor::basic_encode(m).map_err(encode_error)?,
        OutboundMessage::Precommit(m) => sbor::basic_encode(m).map_err(encode_error)?,
    };

    let mut frame = Vec::with_capacity(COMMAND_LENGTH + payload.len());
    frame.extend_from_slice(&message.command().to_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode a frame back into the message it carries.
pub fn decode_frame(data: &[u8]) -> Result<OutboundMessage, CodecError> {
    if data.len() < COMMAND_LENGTH {
        return Err(CodecError::MessageTooShort(data.len()));
    }
    if data.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: data.len(),
            limit: MAX_FRAME_SIZE,
        });
    }

    let (tag, payload) = data.split_at(COMMAND_LENGTH);
    let command = Command::from_bytes(tag)
        .ok_or_else(|| CodecError::UnknownCommand(String::from_utf8_lossy(tag).into_owned()))?;

    let message = match command {
        Command::Addr => OutboundMessage::Addr(
            sbor::basic_decode::<AddrGossip>(payload).map_err(decode_error)?,
        ),
        Command::Version => OutboundMessage::Version(
            sbor::basic_decode::<VersionAnnouncement>(payload).map_err(decode_error)?,
        ),
        Command::GetBlocks => OutboundMessage::GetBlocks(
            sbor::basic_decode::<GetBlocksRequest>(payload).map_err(decode_error)?,
        ),
        Command::Inv => OutboundMessage::Inventory(
            sbor::basic_decode::<InventoryGossip>(payload).map_err(decode_error)?,
        ),
        Command::GetData => OutboundMessage::GetData(
            sbor::basic_decode::<GetDataRequest>(payload).map_err(decode_error)?,
        ),
        Command::Block => OutboundMessage::Block(Box::new(
            sbor::basic_decode::<BlockResponse>(payload).map_err(decode_error)?,
        )),
        Command::Tx => OutboundMessage::Transaction(Box::new(
            sbor::basic_decode::<TransactionGossip>(payload).map_err(decode_error)?,
        )),
        Command::ProposeBlock => OutboundMessage::ProposeBlock(Box::new(
            sbor::basic_decode::<ProposeBlockGossip>(payload).map_err(decode_error)?,
        )),
        Command::GetProposal => OutboundMessage::GetProposal(
            sbor::basic_decode::<GetProposalRequest>(payload).map_err(decode_error)?,
        ),
        Command::Proposal => OutboundMessage::Proposal(
            sbor::basic_decode::<ProposalGossip>(payload).map_err(decode_error)?,
        ),
        Command::Prevote => OutboundMessage::Prevote(
            sbor::basic_decode::<PrevoteGossip>(payload).map_err(decode_error)?,
        ),
        Command::Precommit => OutboundMessage::Precommit(
            sbor::basic_decode::<PrecommitGossip>(payload).map_err(decode_error)?,
        ),
    };
    Ok(message)
}

/// Decode a frame into the event the receiving state machine handles.
pub fn decode_message(data: &[u8]) -> Result<Event, CodecError> {
    decode_frame(data).map(OutboundMessage::into_event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokoin_types::test_utils::{test_block, test_hash, test_reward};
    use tokoin_types::{Block, Prevote, Proposal};

    #[test]
    fn test_frame_starts_with_padded_command() {
        let message = OutboundMessage::GetBlocks(GetBlocksRequest::new("localhost:3001"));
        let frame = encode_message(&message).unwrap();
        assert_eq!(&frame[..COMMAND_LENGTH], b"getblocks\0\0\0");
        assert_eq!(decode_frame(&frame).unwrap(), message);
    }

    #[test]
    fn test_block_and_proposal_frames() {
        let block = test_block(&Block::genesis(), vec![test_reward("alice", 1)]);
        let propose = OutboundMessage::ProposeBlock(Box::new(ProposeBlockGossip::new(
            "localhost:3001",
            block.clone(),
        )));
        let frame = encode_message(&propose).unwrap();
        assert_eq!(decode_frame(&frame).unwrap(), propose);

        let proposal = Proposal {
            from: "localhost:3001".into(),
            height: 0,
            round: 2,
            block_hash: block.hash,
            valid_round: Some(1),
        };
        let frame = encode_message(&OutboundMessage::Proposal(ProposalGossip::new(
            proposal.clone(),
        )))
        .unwrap();
        match decode_message(&frame).unwrap() {
            Event::ProposalReceived { proposal: decoded } => assert_eq!(decoded, proposal),
            other => panic!("unexpected event {}", other.type_name()),
        }
    }

    #[test]
    fn test_nil_prevote_survives_the_wire() {
        let prevote = Prevote {
            from: "localhost:3002".into(),
            height: 4,
            round: 0,
            value: None,
        };
        let frame =
            encode_message(&OutboundMessage::Prevote(PrevoteGossip::new(prevote.clone()))).unwrap();
        match decode_message(&frame).unwrap() {
            Event::PrevoteReceived { prevote: decoded } => {
                assert!(decoded.is_nil());
                assert_eq!(decoded, prevote);
            }
            other => panic!("unexpected event {}", other.type_name()),
        }
    }

    #[test]
    fn test_short_frame_rejected() {
        assert!(matches!(
            decode_frame(b"prevote"),
            Err(CodecError::MessageTooShort(7))
        ));
    }

    #[test]
    fn test_unknown_command_rejected() {
        let mut frame = b"ping\0\0\0\0\0\0\0\0".to_vec();
        frame.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            decode_frame(&frame),
            Err(CodecError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_payload_must_match_command() {
        let message = OutboundMessage::GetProposal(GetProposalRequest::new(
            "localhost:3003",
            test_hash("block"),
        ));
        let mut frame = encode_message(&message).unwrap();
        frame[..COMMAND_LENGTH].copy_from_slice(&Command::Tx.to_bytes());
        assert!(matches!(decode_frame(&frame), Err(CodecError::SborDecode(_))));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut frame = Command::Tx.to_bytes().to_vec();
        frame.resize(MAX_FRAME_SIZE + 1, 0);
        assert!(matches!(
            decode_frame(&frame),
            Err(CodecError::FrameTooLarge { .. })
        ));
    }
}
