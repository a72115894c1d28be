//! Confirmation codes returned by the sensor
//!
//! [`ResponseCode::from_byte`] is total: every byte the sensor documents maps
//! to its own variant and anything else is reported as
//! [`ResponseCode::UndefinedError`], which is also what a command reports
//! when no valid reply arrived at all.

use core::fmt;

/// Outcome of a sensor command
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// Instruction complete (0x00)
    Ok = 0x00,
    /// Error receiving the data packet (0x01)
    ReceiveError = 0x01,
    /// No finger on the sensor (0x02)
    NoFinger = 0x02,
    /// Failed to capture the fingerprint image (0x03)
    ImageFail = 0x03,
    /// Image too dry or too light to generate features (0x04)
    ImageTooLight = 0x04,
    /// Image too humid or too blurry to generate features (0x05)
    ImageTooBlurry = 0x05,
    /// Image too amorphous to generate features (0x06)
    ImageAmorphous = 0x06,
    /// Too few minutiae or too small an area (0x07)
    ImageTooSmall = 0x07,
    /// Fingerprints do not match (0x08)
    Unmatched = 0x08,
    /// No matching fingerprint in the library (0x09)
    NoSearch = 0x09,
    /// Failed to merge the character files (0x0A)
    MergeFail = 0x0A,
    /// Page ID beyond the library (0x0B)
    AddressOutOfRange = 0x0B,
    /// Error reading a template, or the template is invalid (0x0C)
    TemplateError = 0x0C,
    /// Feature upload failed (0x0D)
    UploadFail = 0x0D,
    /// Module cannot receive the following data packet (0x0E)
    ContinuePacketFail = 0x0E,
    /// Image upload failed (0x0F)
    ImageUploadFail = 0x0F,
    /// Failed to delete a template (0x10)
    DeleteFail = 0x10,
    /// Failed to clear the library (0x11)
    DbClearFail = 0x11,
    /// Cannot enter low power mode (0x12)
    LowPowerFail = 0x12,
    /// Wrong password (0x13)
    PasswordIncorrect = 0x13,
    /// System reset failed (0x14)
    ResetFail = 0x14,
    /// No valid original image in the buffer (0x15)
    NoValidImage = 0x15,
    /// Online upgrade failed (0x16)
    UpgradeFail = 0x16,
    /// Incomplete fingerprint, or finger did not move between captures (0x17)
    Incomplete = 0x17,
    /// Flash read/write error (0x18)
    FlashError = 0x18,
    /// Undefined error, also used when no valid reply arrived (0x19)
    UndefinedError = 0x19,
    /// Continue packet received correctly (0xF0)
    ContinueAckF0 = 0xF0,
    /// Continue command packet acknowledged (0xF1)
    ContinueAckF1 = 0xF1,
    /// Sum error while burning internal flash (0xF2)
    SumError = 0xF2,
    /// Packet flag error while burning internal flash (0xF3)
    PacketFlagError = 0xF3,
    /// Packet length error while burning internal flash (0xF4)
    PacketLengthError = 0xF4,
    /// Code too long while burning internal flash (0xF5)
    CodeLengthError = 0xF5,
    /// Burning internal flash failed (0xF6)
    FlashBurnFail = 0xF6,
}

impl ResponseCode {
    /// Classify a raw confirmation byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Ok,
            0x01 => Self::ReceiveError,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageFail,
            0x04 => Self::ImageTooLight,
            0x05 => Self::ImageTooBlurry,
            0x06 => Self::ImageAmorphous,
            0x07 => Self::ImageTooSmall,
            0x08 => Self::Unmatched,
            0x09 => Self::NoSearch,
            0x0A => Self::MergeFail,
            0x0B => Self::AddressOutOfRange,
            0x0C => Self::TemplateError,
            0x0D => Self::UploadFail,
            0x0E => Self::ContinuePacketFail,
            0x0F => Self::ImageUploadFail,
            0x10 => Self::DeleteFail,
            0x11 => Self::DbClearFail,
            0x12 => Self::LowPowerFail,
            0x13 => Self::PasswordIncorrect,
            0x14 => Self::ResetFail,
            0x15 => Self::NoValidImage,
            0x16 => Self::UpgradeFail,
            0x17 => Self::Incomplete,
            0x18 => Self::FlashError,
            0xF0 => Self::ContinueAckF0,
            0xF1 => Self::ContinueAckF1,
            0xF2 => Self::SumError,
            0xF3 => Self::PacketFlagError,
            0xF4 => Self::PacketLengthError,
            0xF5 => Self::CodeLengthError,
            0xF6 => Self::FlashBurnFail,
            _ => Self::UndefinedError,
        }
    }

    /// Raw byte value
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// True for [`ResponseCode::Ok`]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Diagnostic identifier reported on the feedback channel
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "FINGERPRINT_OK",
            Self::ReceiveError => "FINGERPRINT_RECEIVE_ERROR",
            Self::NoFinger => "FINGERPRINT_NO_FINGER",
            Self::ImageFail => "FINGERPRINT_IMAGE_FAIL",
            Self::ImageTooLight => "FINGERPRINT_IMAGE_TOO_LIGHT",
            Self::ImageTooBlurry => "FINGERPRINT_IMAGE_TOO_BLURRY",
            Self::ImageAmorphous => "FINGERPRINT_IMAGE_AMORPHOUS",
            Self::ImageTooSmall => "FINGERPRINT_IMAGE_TOO_SMALL",
            Self::Unmatched => "FINGERPRINT_UNMATCHED",
            Self::NoSearch => "FINGERPRINT_NO_SEARCH",
            Self::MergeFail => "FINGERPRINT_MERGE_FAIL",
            Self::AddressOutOfRange => "FINGERPRINT_ADDRESS_SN_OUT_OF_RANGE",
            Self::TemplateError => "FINGERPRINT_TEMPLATE_ERROR",
            Self::UploadFail => "FINGERPRINT_UPLOAD_FAIL",
            Self::ContinuePacketFail => "FINGERPRINT_CONTINUE_PACKET_FAIL",
            Self::ImageUploadFail => "FINGERPRINT_IMAGE_UPLOAD_FAIL",
            Self::DeleteFail => "FINGERPRINT_DELETE_FAIL",
            Self::DbClearFail => "FINGERPRINT_DB_CLEAR_FAIL",
            Self::LowPowerFail => "FINGERPRINT_LOW_POWER_FAIL",
            Self::PasswordIncorrect => "FINGERPRINT_PASSWORD_INCORRECT",
            Self::ResetFail => "FINGERPRINT_RESET_FAIL",
            Self::NoValidImage => "FINGERPRINT_NO_VALID_IMAGE",
            Self::UpgradeFail => "FINGERPRINT_UPGRADE_FAIL",
            Self::Incomplete => "FINGERPRINT_INCOMPLETE",
            Self::FlashError => "FINGERPRINT_FLASH_ERROR",
            Self::UndefinedError => "FINGERPRINT_UNDEFINED_ERROR",
            Self::ContinueAckF0 => "FINGERPRINT_CONTINUE_ACK_0XF0",
            Self::ContinueAckF1 => "FINGERPRINT_CONTINUE_ACK_0XF1",
            Self::SumError => "FINGERPRINT_SUM_ERROR",
            Self::PacketFlagError => "FINGERPRINT_PACKET_FLAG_ERROR",
            Self::PacketLengthError => "FINGERPRINT_PACKET_LENGTH_ERROR",
            Self::CodeLengthError => "FINGERPRINT_CODE_LENGTH_ERROR",
            Self::FlashBurnFail => "FINGERPRINT_FLASH_BURN_FAIL",
        }
    }
}

impl ResponseCode {
    /// Human readable description
    pub fn message(self) -> &'static str {
        match self {
            Self::Ok => "Instruction complete",
            Self::ReceiveError => "Error receiving the data packet",
            Self::NoFinger => "No finger on the sensor",
            Self::ImageFail => "Failed to capture the image",
            Self::ImageTooLight => "Image too dry or too light",
            Self::ImageTooBlurry => "Image too humid or too blurry",
            Self::ImageAmorphous => "Image too amorphous",
            Self::ImageTooSmall => "Too few minutiae",
            Self::Unmatched => "Fingerprints do not match",
            Self::NoSearch => "No matching fingerprint",
            Self::MergeFail => "Failed to merge the character files",
            Self::AddressOutOfRange => "Page ID beyond the library",
            Self::TemplateError => "Invalid template",
            Self::UploadFail => "Feature upload failed",
            Self::ContinuePacketFail => "Cannot receive the following packet",
            Self::ImageUploadFail => "Image upload failed",
            Self::DeleteFail => "Failed to delete the template",
            Self::DbClearFail => "Failed to clear the library",
            Self::LowPowerFail => "Cannot enter low power mode",
            Self::PasswordIncorrect => "Wrong password",
            Self::ResetFail => "System reset failed",
            Self::NoValidImage => "No valid image in the buffer",
            Self::UpgradeFail => "Online upgrade failed",
            Self::Incomplete => "Incomplete fingerprint",
            Self::FlashError => "Flash read/write error",
            Self::UndefinedError => "Undefined error",
            Self::ContinueAckF0 => "Continue packet received",
            Self::ContinueAckF1 => "Continue command acknowledged",
            Self::SumError => "Sum error while burning flash",
            Self::PacketFlagError => "Packet flag error while burning flash",
            Self::PacketLengthError => "Packet length error while burning flash",
            Self::CodeLengthError => "Code too long while burning flash",
            Self::FlashBurnFail => "Burning flash failed",
        }
    }
}

impl From<u8> for ResponseCode {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.message(), self.as_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_bytes_round_trip() {
        let declared = (0x00u8..=0x19).chain(0xF0..=0xF6);
        for byte in declared {
            let code = ResponseCode::from_byte(byte);
            assert_eq!(code.as_byte(), byte, "byte {:#04x}", byte);
        }
    }

    #[test]
    fn test_undeclared_bytes_are_undefined() {
        for byte in [0x1A, 0x1F, 0x20, 0x7F, 0xEF, 0xF7, 0xFE, 0xFF] {
            assert_eq!(ResponseCode::from_byte(byte), ResponseCode::UndefinedError);
        }
    }

    #[test]
    fn test_classifier_is_total() {
        let undefined = (0u8..=255)
            .filter(|&b| ResponseCode::from_byte(b) == ResponseCode::UndefinedError)
            .count();
        // 0x19 itself plus every byte that is not declared
        assert_eq!(undefined, 256 - 32);
    }

    #[test]
    fn test_specific_mappings() {
        assert_eq!(ResponseCode::from_byte(0x00), ResponseCode::Ok);
        assert_eq!(ResponseCode::from_byte(0x02), ResponseCode::NoFinger);
        assert_eq!(ResponseCode::from_byte(0x0A), ResponseCode::MergeFail);
        assert_eq!(ResponseCode::from_byte(0xF6), ResponseCode::FlashBurnFail);
        assert!(ResponseCode::Ok.is_ok());
        assert!(!ResponseCode::NoFinger.is_ok());
    }

    #[test]
    fn test_names() {
        assert_eq!(ResponseCode::NoFinger.name(), "FINGERPRINT_NO_FINGER");
        assert_eq!(
            ResponseCode::AddressOutOfRange.name(),
            "FINGERPRINT_ADDRESS_SN_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_display_is_readable() {
        assert_eq!(ResponseCode::NoFinger.to_string(), "No finger on the sensor (0x02)");
        assert_eq!(ResponseCode::UndefinedError.to_string(), "Undefined error (0x19)");
        assert_eq!(ResponseCode::from_byte(0xF6).to_string(), "Burning flash failed (0xf6)");
    }
}
