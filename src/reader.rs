use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{LedError, Result};

/// Read exactly `count` bytes, accumulating across partial socket reads.
///
/// A zero-length read means the peer hung up, which is reported as
/// [`LedError::ConnectionClosed`]. A short buffer is never returned.
pub async fn read_exact_bytes<R>(reader: &mut R, count: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; count];
    let mut filled = 0;

    while filled < count {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(LedError::ConnectionClosed);
        }
        filled += n;
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn collects_bytes_across_split_writes() {
        let (mut client, mut server) = tokio::io::duplex(2);

        let writer = tokio::spawn(async move {
            client.write_all(&[1, 2, 3, 4, 5, 6, 7]).await.unwrap();
        });

        let bytes = read_exact_bytes(&mut server, 7).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7]);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn peer_close_mid_read_is_connection_closed() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[9, 9]).await.unwrap();
        drop(client);

        let err = read_exact_bytes(&mut server, 4).await.unwrap_err();
        assert!(matches!(err, LedError::ConnectionClosed));
    }

    #[tokio::test]
    async fn zero_count_reads_nothing() {
        let (_client, mut server) = tokio::io::duplex(8);
        let bytes = read_exact_bytes(&mut server, 0).await.unwrap();
        assert!(bytes.is_empty());
    }
}
