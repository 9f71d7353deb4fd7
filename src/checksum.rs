//! Checksum strategies for request frames.
//!
//! A [`Dialect`](crate::dialect::Dialect) plugs in one of these functions (or
//! any other `fn(&[u8]) -> u8`) to checksum the bytes of a frame.

/// The signature of a checksum strategy.
pub type ChecksumFn = fn(&[u8]) -> u8;

/// A running 8-bit sum hasher.
#[derive(Debug, Default)]
pub(crate) struct Sum {
	/// The hash value
	sum: u8,
}

impl Sum {
	/// Update the sum with the specified byte.
	pub fn update(&mut self, byte: u8) {
		self.sum = self.sum.wrapping_add(byte);
	}

	/// Clear the hasher's state. This returns the hasher to the state after
	/// initially calling `Sum::default()`.
	pub fn reset(&mut self) {
		self.sum = 0;
	}

	/// Finish calculating the sum.
	///
	/// The hasher's state is reset.
	pub fn finish(&mut self) -> u8 {
		let sum = self.sum;
		self.reset();
		sum
	}
}

/// The sum of all byte values, modulo 256.
///
/// Used by the MKS dialect.
pub fn additive(input: &[u8]) -> u8 {
	let mut hasher = Sum::default();
	for byte in input {
		hasher.update(*byte);
	}
	hasher.finish()
}

/// A running total decremented by each byte value, modulo 256.
///
/// This is the two's complement of [`additive`]. Used by the Ultraflex
/// dialect.
pub fn subtractive(input: &[u8]) -> u8 {
	additive(input).wrapping_neg()
}

/// Render a checksum as exactly two uppercase, zero-padded hexadecimal characters.
pub fn render(checksum: u8) -> [u8; 2] {
	const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
	[
		DIGITS[usize::from(checksum >> 4)],
		DIGITS[usize::from(checksum & 0x0F)],
	]
}

/// Verify that `rendered` is the checksum of `input` as computed by `checksum`.
pub fn verify(checksum: ChecksumFn, input: &[u8], rendered: &[u8]) -> bool {
	rendered == render(checksum(input))
}

#[cfg(test)]
mod test {
	use super::*;

	/// Deterministic byte sequences covering the full byte range.
	fn sequences() -> impl Iterator<Item = Vec<u8>> {
		(0..=64usize).map(|len| {
			(0..len)
				.map(|i| (i * 37 + len * 11) as u8)
				.collect::<Vec<u8>>()
		})
	}

	#[test]
	fn test_additive() {
		assert_eq!(additive(b""), 0);
		assert_eq!(additive(b"@001FS?;"), 0xE4);
		assert_eq!(additive(&[0xFF, 0x02]), 0x01);
	}

	#[test]
	fn test_subtractive() {
		assert_eq!(subtractive(b""), 0);
		assert_eq!(subtractive(b"S3i"), 0x11);
		for input in sequences() {
			assert_eq!(
				additive(&input).wrapping_add(subtractive(&input)),
				0,
				"{input:?}"
			);
		}
	}

	#[test]
	fn test_render() {
		assert_eq!(&render(0x00), b"00");
		assert_eq!(&render(0x0A), b"0A");
		assert_eq!(&render(0xE4), b"E4");
		assert_eq!(&render(0xFF), b"FF");
		for input in sequences() {
			for checksum in [additive as ChecksumFn, subtractive] {
				let rendered = render(checksum(&input));
				assert!(
					rendered
						.iter()
						.all(|c| c.is_ascii_digit() || (b'A'..=b'F').contains(c)),
					"{rendered:?}"
				);
			}
		}
	}

	#[test]
	fn test_verify() {
		assert!(verify(additive, b"@001FS?;", b"E4"));
		assert!(!verify(additive, b"@001FS?;", b"e4"));
		assert!(!verify(subtractive, b"@001FS?;", b"E4"));
	}

	#[test]
	fn test_sum_reset() {
		let mut hasher = Sum::default();
		hasher.update(b'h');
		hasher.reset();
		hasher.update(b'A');
		assert_eq!(hasher.finish(), b'A');
		assert_eq!(hasher.finish(), 0);
	}
}
