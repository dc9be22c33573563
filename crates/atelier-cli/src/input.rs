use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::Mutex;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Line source shared by the studio loop and the credential prompt, so both
/// read from one buffer.
pub struct LineInput {
    lines: Mutex<Lines<BufReader<BoxedReader>>>,
}

impl LineInput {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Arc<Self> {
        let reader: BoxedReader = Box::new(reader);
        Arc::new(Self {
            lines: Mutex::new(BufReader::new(reader).lines()),
        })
    }

    pub fn stdin() -> Arc<Self> {
        Self::new(tokio::io::stdin())
    }

    /// Next line without its terminator, or `None` at end of input.
    pub async fn next_line(&self) -> io::Result<Option<String>> {
        self.lines.lock().await.next_line().await
    }
}
