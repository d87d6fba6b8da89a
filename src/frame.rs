use static_assertions::const_assert_eq;

/// Maximum payload bytes in a classic CAN frame.
pub const CAN_MAX_DLC: usize = 8;

/// Mask for 11-bit standard identifiers.
pub const STANDARD_ID_MASK: u16 = 0x07FF;

/// Fixed-layout frame representation expected by the adapter driver.
///
/// The payload buffer always occupies 8 bytes regardless of the declared
/// length; bytes beyond `dlc` are present on the wire but carry no meaning.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFrame {
    pub id: u32,
    pub dlc: u8,
    pub data: [u8; CAN_MAX_DLC],
}

// Adapter ABI: 4-byte id + dlc + 8 payload bytes, padded to 16.
const_assert_eq!(core::mem::size_of::<WireFrame>(), 16);

/// A logical CAN frame: 11-bit standard identifier, declared length,
/// zero-filled 8-byte payload buffer.
///
/// Value type, immutable after construction. Only the first `dlc` bytes of
/// the buffer are meaningful and only those are ever exposed by [`data`].
///
/// [`data`]: CanFrame::data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: u16,
    dlc: u8,
    data: [u8; CAN_MAX_DLC],
}

impl CanFrame {
    /// Builds a frame from an identifier and payload.
    ///
    /// Policy: payloads longer than 8 bytes are truncated to the first 8,
    /// identifiers above `0x7FF` are masked to 11 bits. Both are caller
    /// contract violations and trip a `debug_assert!` in debug builds;
    /// keeping construction infallible matters on the transmit tick path.
    /// Trailing buffer bytes are always zero so stale memory never reaches
    /// the bus write.
    pub fn new(id: u16, payload: &[u8]) -> Self {
        debug_assert!(
            payload.len() <= CAN_MAX_DLC,
            "payload length {} exceeds CAN maximum of {}",
            payload.len(),
            CAN_MAX_DLC
        );
        debug_assert!(
            id <= STANDARD_ID_MASK,
            "identifier {id:#X} exceeds 11-bit standard range"
        );

        let dlc = payload.len().min(CAN_MAX_DLC);
        let mut data = [0u8; CAN_MAX_DLC];
        data[..dlc].copy_from_slice(&payload[..dlc]);

        Self {
            id: id & STANDARD_ID_MASK,
            dlc: dlc as u8,
            data,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// The meaningful payload bytes: exactly the first `dlc` of the buffer.
    pub fn data(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc)]
    }

    /// Encodes into the adapter's fixed-size wire representation.
    pub fn to_wire(&self) -> WireFrame {
        WireFrame {
            id: u32::from(self.id),
            dlc: self.dlc,
            data: self.data,
        }
    }

    /// Decodes a wire frame received from the adapter.
    ///
    /// `dlc` is clamped to 8 and bytes beyond it are zeroed, so a
    /// misbehaving adapter can neither cause an out-of-bounds read nor leak
    /// stale buffer content into the logical frame.
    pub fn from_wire(wire: &WireFrame) -> Self {
        let dlc = usize::from(wire.dlc).min(CAN_MAX_DLC);
        let mut data = [0u8; CAN_MAX_DLC];
        data[..dlc].copy_from_slice(&wire.data[..dlc]);

        Self {
            id: (wire.id & u32::from(STANDARD_ID_MASK)) as u16,
            dlc: dlc as u8,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_payload() {
        for len in 0..=CAN_MAX_DLC {
            let payload: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(17)).collect();
            let frame = CanFrame::new(0x123, &payload);
            let decoded = CanFrame::from_wire(&frame.to_wire());

            assert_eq!(decoded.id(), 0x123);
            assert_eq!(decoded.dlc() as usize, len);
            assert_eq!(decoded.data(), payload.as_slice());
        }
    }

    #[test]
    fn trailing_wire_bytes_are_zero_filled() {
        let frame = CanFrame::new(0x100, &[0xAA, 0xBB]);
        let wire = frame.to_wire();

        assert_eq!(wire.dlc, 2);
        assert_eq!(&wire.data[..2], &[0xAA, 0xBB]);
        assert_eq!(&wire.data[2..], &[0u8; 6]);
    }

    #[test]
    fn data_never_exposes_bytes_past_dlc() {
        let wire = WireFrame {
            id: 0x7FF,
            dlc: 2,
            data: [0xAB, 0xCD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        };
        let frame = CanFrame::from_wire(&wire);

        assert_eq!(frame.data(), &[0xAB, 0xCD]);
        assert_eq!(frame.data().len(), 2);
    }

    #[test]
    fn oversized_wire_dlc_is_clamped() {
        let wire = WireFrame {
            id: 0x200,
            dlc: 15,
            data: [1, 2, 3, 4, 5, 6, 7, 8],
        };
        let frame = CanFrame::from_wire(&wire);

        assert_eq!(frame.dlc() as usize, CAN_MAX_DLC);
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn wire_identifier_is_masked_to_standard_range() {
        let wire = WireFrame {
            id: 0x1FFF_F7FF,
            dlc: 0,
            data: [0; 8],
        };
        assert_eq!(CanFrame::from_wire(&wire).id(), 0x7FF);
    }

    #[test]
    fn stale_wire_bytes_past_dlc_are_zeroed_on_decode() {
        let wire = WireFrame {
            id: 0x100,
            dlc: 1,
            data: [0x11, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0x99],
        };
        let decoded = CanFrame::from_wire(&wire);
        let rewired = decoded.to_wire();

        assert_eq!(rewired.data, [0x11, 0, 0, 0, 0, 0, 0, 0]);
    }
}
