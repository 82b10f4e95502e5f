//! Canonical byte layouts shared with the oracle signer.
//!
//! Attestation message (version 1):
//!
//! ```text
//! DOMAIN_TAG (14) || VERSION (1) || CATEGORY (1) || PROFILE_ID (32)
//!   || Σ ( LE32(|field|) || field ) || LE64(timestamp_ms)
//! ```
//!
//! Any change to field order or widths is a protocol break and needs a new
//! `MESSAGE_VERSION`.

use attest_primitives::{constants::{LEN_U32, LEN_U64, LEN_U8}, le_bytes, u32_from_le};

use crate::{
    errors::AttestError,
    types::{Badge, ClaimCategory, ProfileId, DOMAIN_TAG, MESSAGE_HEADER_LEN, MESSAGE_VERSION},
};

fn write_lp(out: &mut Vec<u8>, b: &[u8]) {
    out.extend_from_slice(&le_bytes::<4>(b.len() as u128));
    out.extend_from_slice(b);
}

/// Build the exact bytes the oracle signs for a claim.
#[must_use]
pub fn build_message(
    category: ClaimCategory,
    profile_id: &ProfileId,
    fields: &[&[u8]],
    timestamp_ms: u64,
) -> Vec<u8> {
    let body: usize = fields.iter().map(|f| LEN_U32 + f.len()).sum();
    let mut v = Vec::with_capacity(MESSAGE_HEADER_LEN + body + LEN_U64);
    v.extend_from_slice(DOMAIN_TAG);          // 14
    v.push(MESSAGE_VERSION);                  // 1
    v.push(category.tag());                   // 1
    v.extend_from_slice(&profile_id.0);       // 32
    for f in fields {
        write_lp(&mut v, f);
    }
    v.extend_from_slice(&le_bytes::<8>(u128::from(timestamp_ms))); // 8
    v
}

/// Message attesting that `address` on `chain` belongs to the profile.
#[must_use]
pub fn wallet_message(profile_id: &ProfileId, chain: &str, address: &str, timestamp_ms: u64) -> Vec<u8> {
    build_message(
        ClaimCategory::Wallet,
        profile_id,
        &[chain.as_bytes(), address.as_bytes()],
        timestamp_ms,
    )
}

/// Message attesting that `username` on `platform` belongs to the profile.
#[must_use]
pub fn social_message(profile_id: &ProfileId, platform: &str, username: &str, timestamp_ms: u64) -> Vec<u8> {
    build_message(
        ClaimCategory::Social,
        profile_id,
        &[platform.as_bytes(), username.as_bytes()],
        timestamp_ms,
    )
}

/// Message attesting that the profile earned the encoded badge batch.
#[must_use]
pub fn badges_message(profile_id: &ProfileId, encoded_badges: &[u8], timestamp_ms: u64) -> Vec<u8> {
    build_message(ClaimCategory::Badges, profile_id, &[encoded_badges], timestamp_ms)
}

// Badge batch codec

/// Bounds enforced while decoding a badge batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeLimits {
    pub max_badges: usize,
    pub max_field_len: usize,
}

/// Canonical badge batch: `LE32(count)` || count * record, where a record is
/// `lp(category) || lp(tier) || lp(display_name) || lp(description)
/// || has_image(u8) || [lp(image_url)] || tier_number(u8)`.
#[must_use]
pub fn encode_badges(badges: &[Badge]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&le_bytes::<4>(badges.len() as u128));
    for b in badges {
        write_lp(&mut v, b.category.as_bytes());
        write_lp(&mut v, b.tier.as_bytes());
        write_lp(&mut v, b.display_name.as_bytes());
        write_lp(&mut v, b.description.as_bytes());
        match &b.image_url {
            Some(url) => {
                v.push(1);
                write_lp(&mut v, url.as_bytes());
            }
            None => v.push(0),
        }
        v.push(b.tier_number);
    }
    v
}

struct Reader<'a> {
    src: &'a [u8],
    index: usize,
    limits: BadgeLimits,
}

impl<'a> Reader<'a> {
    const fn malformed(&self, reason: &'static str) -> AttestError {
        AttestError::MalformedBadgeRecord { index: self.index, reason }
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], AttestError> {
        if self.src.len() < n {
            return Err(self.malformed("input too short"));
        }
        let (a, b) = self.src.split_at(n);
        self.src = b;
        Ok(a)
    }

    fn read_u8(&mut self) -> Result<u8, AttestError> {
        Ok(self.read_exact(LEN_U8)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, AttestError> {
        Ok(u32_from_le(self.read_exact(LEN_U32)?))
    }

    fn read_text(&mut self, required: bool) -> Result<String, AttestError> {
        let len = self.read_u32()? as usize;
        if len > self.limits.max_field_len {
            return Err(self.malformed("field too long"));
        }
        let bytes = self.read_exact(len)?;
        if required && bytes.is_empty() {
            return Err(self.malformed("required field is empty"));
        }
        String::from_utf8(bytes.to_vec()).map_err(|_| self.malformed("field is not valid UTF-8"))
    }

    fn read_badge(&mut self) -> Result<Badge, AttestError> {
        let category = self.read_text(true)?;
        let tier = self.read_text(true)?;
        let display_name = self.read_text(true)?;
        let description = self.read_text(false)?;
        let image_url = match self.read_u8()? {
            0 => None,
            1 => Some(self.read_text(true)?),
            _ => return Err(self.malformed("has_image flag must be 0 or 1")),
        };
        let tier_number = self.read_u8()?;
        Ok(Badge { category, tier, display_name, description, image_url, tier_number })
    }
}

/// Decode and validate a badge batch. Any bad record rejects the whole batch.
///
/// # Errors
///
/// `MalformedBadgeRecord` naming the first offending record.
pub fn decode_badges(src: &[u8], limits: BadgeLimits) -> Result<Vec<Badge>, AttestError> {
    let mut r = Reader { src, index: 0, limits };
    let count = r.read_u32()? as usize;
    if count == 0 {
        return Err(r.malformed("empty batch"));
    }
    if count > limits.max_badges {
        return Err(r.malformed("too many badges in batch"));
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        r.index = i;
        out.push(r.read_badge()?);
    }
    if !r.src.is_empty() {
        return Err(r.malformed("trailing bytes after batch"));
    }
    Ok(out)
}
