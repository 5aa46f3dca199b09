use zeroize::Zeroizing;

use crate::data::Buffer;
use crate::error::Reason;

/// Size of the scratch buffer handed to passphrase callbacks.
pub const PASSPHRASE_CAPACITY: usize = 1024;

/// Fills `buf` with a passphrase and returns its length. A return of zero or
/// less declines. `rwflag` is 0 when reading a key and 1 when writing one.
pub type PasswordCallback<U> = fn(buf: &mut [u8], rwflag: i32, user: Option<&U>) -> i32;

/// Never supplies a passphrase, so encrypted keys fail instead of prompting.
pub fn no_password_callback<U>(_buf: &mut [u8], _rwflag: i32, _user: Option<&U>) -> i32 {
    0
}

/// Copies the passphrase carried in `user`. Returns -1 when there is none or
/// it does not fit.
pub fn password_callback(buf: &mut [u8], _rwflag: i32, user: Option<&Buffer<'_, u8>>) -> i32 {
    let Some(passphrase) = user else {
        return -1;
    };
    let len = passphrase.len();
    if len > buf.len() {
        return -1;
    }
    buf[..len].copy_from_slice(passphrase.data());
    i32::try_from(len).unwrap_or(-1)
}

/// Asks `callback` for a passphrase. The scratch buffer is wiped afterwards.
pub(crate) fn read_passphrase(
    callback: &mut dyn FnMut(&mut [u8], i32) -> i32,
) -> Result<Zeroizing<Vec<u8>>, Reason> {
    let mut scratch = Zeroizing::new(vec![0u8; PASSPHRASE_CAPACITY]);
    let written = callback(&mut scratch[..], 0);
    let len = usize::try_from(written).unwrap_or(0);
    if len == 0 || len > scratch.len() {
        return Err(Reason::PEM_BAD_PASSWORD_READ);
    }
    Ok(Zeroizing::new(scratch[..len].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_password_declines() {
        let mut buf = [0u8; 8];
        assert_eq!(no_password_callback::<()>(&mut buf, 0, None), 0);
    }

    #[test]
    fn copies_passphrase() {
        let mut buf = [0u8; 8];
        let pass = Buffer::from("hunter2");
        assert_eq!(password_callback(&mut buf, 0, Some(&pass)), 7);
        assert_eq!(&buf[..7], b"hunter2");
    }

    #[test]
    fn rejects_missing_or_oversized() {
        let mut buf = [0u8; 4];
        assert_eq!(password_callback(&mut buf, 0, None), -1);
        let pass = Buffer::from("too long");
        assert_eq!(password_callback(&mut buf, 0, Some(&pass)), -1);
    }

    #[test]
    fn declined_read_is_bad_password() {
        let mut declines = |_: &mut [u8], _: i32| 0;
        assert_eq!(
            read_passphrase(&mut declines).unwrap_err(),
            Reason::PEM_BAD_PASSWORD_READ
        );
        let mut supplies = |buf: &mut [u8], _: i32| {
            buf[..3].copy_from_slice(b"abc");
            3
        };
        assert_eq!(read_passphrase(&mut supplies).unwrap().as_slice(), b"abc");
    }
}
