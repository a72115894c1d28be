//! Fingerprint sensor driver
//!
//! Wraps a [`SensorLink`]. Plain commands go through [`Fingerprint::run`];
//! the two commands whose reply carries data (search, template count) have
//! their own methods. Every reply is classified into a [`ResponseCode`]; a
//! missing or malformed reply is reported as
//! [`ResponseCode::UndefinedError`] and logged.

use crate::config::protocol::SEARCH_REPLY_LENGTH;
use crate::protocol::AckFrame;
use crate::sensor::commands::SensorCommand;
use crate::sensor::response::ResponseCode;
use crate::sensor::traits::{LinkError, SensorLink};

/// Result of a library search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReply {
    pub code: ResponseCode,
    /// Matched page (slot ID), offsets 5-6 of the reply
    pub page_id: u16,
    /// Match score, offsets 7-8 of the reply
    pub score: u16,
}

impl SearchReply {
    fn failed(code: ResponseCode) -> Self {
        Self {
            code,
            page_id: 0,
            score: 0,
        }
    }
}

/// Driver for an AS608-style sensor on a [`SensorLink`]
pub struct Fingerprint<L> {
    link: L,
}

impl<L: SensorLink> Fingerprint<L> {
    /// Create a driver over a link
    pub fn new(link: L) -> Self {
        Self { link }
    }

    /// Access the underlying link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Release the underlying link
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Send a command and return the acknowledge frame
    async fn execute(&mut self, command: SensorCommand) -> Result<AckFrame, LinkError> {
        let packet = command.packet();
        log::debug!("Sensor TX {}: {:02x?}", command.label(), packet.as_slice());

        let frame = self
            .link
            .transact(&packet, command.reply_timeout_ms())
            .await?;

        if !frame.is_ack() {
            return Err(LinkError::InvalidReply);
        }
        Ok(frame)
    }

    /// Send a command and classify its confirmation code
    pub async fn run(&mut self, command: SensorCommand) -> ResponseCode {
        match self.execute(command).await {
            Ok(frame) => {
                let code = ResponseCode::from_byte(frame.confirmation_code());
                log::debug!("Sensor RX {}: {}", command.label(), code);
                code
            }
            Err(e) => {
                log::warn!("Sensor {} got no valid reply: {:?}", command.label(), e);
                ResponseCode::UndefinedError
            }
        }
    }

    /// Search the library with character buffer 1.
    ///
    /// The reply is only trusted when its length field says it is a search
    /// reply; anything else reports `UndefinedError`.
    pub async fn search(&mut self) -> SearchReply {
        let command = SensorCommand::Search;
        let frame = match self.execute(command).await {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Sensor Search got no valid reply: {:?}", e);
                return SearchReply::failed(ResponseCode::UndefinedError);
            }
        };

        if frame.as_bytes()[3] != SEARCH_REPLY_LENGTH {
            log::warn!("Sensor Search reply has unexpected length {}", frame.length());
            return SearchReply::failed(ResponseCode::UndefinedError);
        }

        let reply = SearchReply {
            code: ResponseCode::from_byte(frame.confirmation_code()),
            page_id: frame.data_word(),
            score: frame.match_score(),
        };
        log::debug!(
            "Sensor RX Search: {} page {} score {}",
            reply.code,
            reply.page_id,
            reply.score
        );
        reply
    }

    /// Number of templates stored in the library
    pub async fn template_count(&mut self) -> Result<u16, ResponseCode> {
        let command = SensorCommand::TemplateCount;
        match self.execute(command).await {
            Ok(frame) => match ResponseCode::from_byte(frame.confirmation_code()) {
                ResponseCode::Ok => Ok(frame.data_word()),
                code => Err(code),
            },
            Err(e) => {
                log::warn!("Sensor TemplateCount got no valid reply: {:?}", e);
                Err(ResponseCode::UndefinedError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::protocol::ACK_BUFFER_SIZE;
    use crate::sensor::commands::CharBuffer;
    use crate::sensor::traits::mock::MockSensorLink;

    #[test]
    fn test_run_classifies_codes() {
        let link = MockSensorLink::new();
        link.queue_code(0x02);
        link.queue_code(0x00);
        let mut sensor = Fingerprint::new(link);

        futures::executor::block_on(async {
            assert_eq!(sensor.run(SensorCommand::GetImage).await, ResponseCode::NoFinger);
            assert_eq!(sensor.run(SensorCommand::GetImage).await, ResponseCode::Ok);
        });

        let link = sensor.into_inner();
        assert_eq!(link.sent_instructions().as_slice(), &[0x01, 0x01]);
    }

    #[test]
    fn test_no_reply_is_undefined() {
        let link = MockSensorLink::new();
        link.queue_reply(Err(LinkError::Timeout));
        link.queue_reply(Err(LinkError::WriteFailed));
        let mut sensor = Fingerprint::new(link);

        futures::executor::block_on(async {
            assert_eq!(sensor.run(SensorCommand::CreateTemplate).await, ResponseCode::UndefinedError);
            assert_eq!(sensor.run(SensorCommand::Store { slot: 3 }).await, ResponseCode::UndefinedError);
        });
    }

    #[test]
    fn test_non_ack_packet_is_undefined() {
        let link = MockSensorLink::new();
        let mut bytes = *AckFrame::reply(0x00, &[]).as_bytes();
        bytes[1] = 0x02; // data packet, not an acknowledgment
        link.queue_reply(Ok(AckFrame::from_bytes(bytes)));
        link.queue_reply(Ok(AckFrame::empty()));
        let mut sensor = Fingerprint::new(link);

        futures::executor::block_on(async {
            assert_eq!(sensor.run(SensorCommand::GetImage).await, ResponseCode::UndefinedError);
            // A buffer that was never refreshed holds zeros
            assert_eq!(sensor.run(SensorCommand::GetImage).await, ResponseCode::UndefinedError);
        });
    }

    #[test]
    fn test_undeclared_code_is_undefined() {
        let link = MockSensorLink::new();
        link.queue_code(0x1A);
        let mut sensor = Fingerprint::new(link);

        futures::executor::block_on(async {
            assert_eq!(sensor.run(SensorCommand::CreateCharFile(CharBuffer::Two)).await, ResponseCode::UndefinedError);
        });
    }

    #[test]
    fn test_search_match() {
        let link = MockSensorLink::new();
        link.queue_reply(Ok(AckFrame::reply(0x00, &[0x00, 0x05, 0x00, 0x50])));
        let mut sensor = Fingerprint::new(link);

        let reply = futures::executor::block_on(sensor.search());
        assert_eq!(reply.code, ResponseCode::Ok);
        assert_eq!(reply.page_id, 5);
        assert_eq!(reply.score, 0x50);
        assert_eq!(sensor.link().timeouts().as_slice(), &[5000]);
    }

    #[test]
    fn test_search_not_found() {
        let link = MockSensorLink::new();
        link.queue_reply(Ok(AckFrame::reply(0x09, &[0x00, 0x00, 0x00, 0x00])));
        let mut sensor = Fingerprint::new(link);

        let reply = futures::executor::block_on(sensor.search());
        assert_eq!(reply.code, ResponseCode::NoSearch);
    }

    #[test]
    fn test_search_requires_search_length() {
        let link = MockSensorLink::new();
        // A plain 3-byte acknowledgment is not a search reply
        link.queue_code(0x00);
        let mut sensor = Fingerprint::new(link);

        let reply = futures::executor::block_on(sensor.search());
        assert_eq!(reply.code, ResponseCode::UndefinedError);
    }

    #[test]
    fn test_search_uses_full_page_id() {
        let link = MockSensorLink::new();
        let mut bytes = [0u8; ACK_BUFFER_SIZE];
        bytes[..9].copy_from_slice(&[0xFF, 0x07, 0x00, 0x07, 0x00, 0x01, 0x02, 0x00, 0x10]);
        link.queue_reply(Ok(AckFrame::from_bytes(bytes)));
        let mut sensor = Fingerprint::new(link);

        let reply = futures::executor::block_on(sensor.search());
        assert_eq!(reply.page_id, 0x0102);
    }

    #[test]
    fn test_template_count() {
        let link = MockSensorLink::new();
        link.queue_code_with_word(0x00, 12);
        link.queue_code(0x01);
        let mut sensor = Fingerprint::new(link);

        futures::executor::block_on(async {
            assert_eq!(sensor.template_count().await, Ok(12));
            assert_eq!(sensor.template_count().await, Err(ResponseCode::ReceiveError));
        });
    }

    #[test]
    fn test_store_and_delete_packets() {
        let link = MockSensorLink::new();
        link.queue_code(0x00);
        link.queue_code(0x00);
        let mut sensor = Fingerprint::new(link);

        futures::executor::block_on(async {
            assert!(sensor.run(SensorCommand::Store { slot: 42 }).await.is_ok());
            assert!(sensor.run(SensorCommand::DeleteAll).await.is_ok());
        });

        let sent = sensor.link().sent();
        assert_eq!(&sent[0][6..], &[0x01, 0x00, 0x06, 0x06, 0x01, 0x00, 42, 0x00, 0x38]);
        assert_eq!(&sent[1][6..], &[0x01, 0x00, 0x03, 0x0D, 0x00, 0x11]);
    }
}
