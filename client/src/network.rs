use crate::display::ReceivedMessage;
use crate::error::ClientError;
use log::{info, warn};
use shared::{read_packet, write_packet, Packet};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INCOMING_QUEUE_LEN: usize = 256;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub struct Client {
    user: String,
    writer: BoxedWriter,
    incoming: mpsc::Receiver<ReceivedMessage>,
    reader_task: JoinHandle<()>,
}

impl Client {
    /// Connects to the server and logs in.
    pub async fn connect(addr: &str, user: &str, secret: &str) -> Result<Self, ClientError> {
        info!("Connecting to {} as {}", addr, user);
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream, user, secret).await
    }

    /// Logs in over an already established stream.
    ///
    /// Sends the credentials as the first frame and waits for the server's
    /// verdict. On success a background task starts forwarding incoming
    /// messages to [`Client::recv`].
    pub async fn handshake<S>(stream: S, user: &str, secret: &str) -> Result<Self, ClientError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);

        let login = Packet::Login {
            user: user.to_string(),
            secret: secret.to_string(),
        };
        write_packet(&mut writer, &login).await?;

        match read_packet(&mut reader).await? {
            Some(Packet::LoginAccepted { .. }) => info!("Logged in as {}", user),
            Some(Packet::LoginRejected { reason }) => {
                return Err(ClientError::LoginRejected(reason));
            }
            Some(other) => {
                return Err(ClientError::UnexpectedPacket(format!("{:?}", other)));
            }
            None => return Err(ClientError::ConnectionClosed),
        }

        let (incoming_tx, incoming) = mpsc::channel(INCOMING_QUEUE_LEN);
        let reader_task = tokio::spawn(receive_messages(reader, incoming_tx));

        Ok(Client {
            user: user.to_string(),
            writer: Box::new(writer),
            incoming,
            reader_task,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Sends one chat line. Blank lines are skipped.
    pub async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let packet = Packet::Chat {
            text: text.to_string(),
        };
        write_packet(&mut self.writer, &packet).await?;
        Ok(())
    }

    /// Next message relayed by the server, or `None` once the server closed
    /// the connection.
    pub async fn recv(&mut self) -> Option<ReceivedMessage> {
        self.incoming.recv().await
    }

    /// Closes the sending side, which the server treats as a clean logout.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Interactive loop: stdin lines are sent, incoming messages printed.
    ///
    /// Ends when stdin is closed (Ctrl-D) or the server goes away.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!(
            "Logged in as {}. Type a message and press Enter, Ctrl-D to quit.",
            self.user
        );

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.send(&line).await?,
                    None => {
                        info!("Input closed, disconnecting");
                        break;
                    }
                },
                message = self.incoming.recv() => match message {
                    Some(message) => println!("{}", message),
                    None => {
                        warn!("Server closed the connection");
                        return Ok(());
                    }
                },
            }
        }

        self.close().await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Forwards relayed messages from the socket until it closes or fails.
async fn receive_messages<R>(mut reader: R, incoming: mpsc::Sender<ReceivedMessage>)
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_packet(&mut reader).await {
            Ok(Some(Packet::Message(message))) => {
                if incoming.send(ReceivedMessage::now(message)).await.is_err() {
                    break;
                }
            }
            Ok(Some(other)) => warn!("Unexpected packet from server: {:?}", other),
            Ok(None) => {
                info!("Server closed the connection");
                break;
            }
            Err(e) => {
                warn!("Chat failed: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ChatMessage;
    use tokio::io::DuplexStream;

    /// Reads the login frame on the server side of a duplex pipe.
    async fn expect_login(server: &mut DuplexStream, user: &str, secret: &str) {
        let expected = Packet::Login {
            user: user.to_string(),
            secret: secret.to_string(),
        };
        assert_eq!(read_packet(server).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_handshake_accepted() {
        let (client_end, mut server_end) = tokio::io::duplex(4096);

        let server = tokio::spawn(async move {
            expect_login(&mut server_end, "alice", "pw1").await;
            let accepted = Packet::LoginAccepted {
                user: "alice".to_string(),
            };
            write_packet(&mut server_end, &accepted).await.unwrap();
            let message = Packet::Message(ChatMessage::new("bob", "welcome"));
            write_packet(&mut server_end, &message).await.unwrap();
            server_end
        });

        let mut client = Client::handshake(client_end, "alice", "pw1").await.unwrap();
        assert_eq!(client.user(), "alice");

        let received = client.recv().await.unwrap();
        assert_eq!(received.message, ChatMessage::new("bob", "welcome"));

        let server_end = server.await.unwrap();
        drop(server_end);
        assert!(client.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_handshake_rejected() {
        let (client_end, mut server_end) = tokio::io::duplex(4096);

        tokio::spawn(async move {
            expect_login(&mut server_end, "alice", "wrong").await;
            let rejected = Packet::LoginRejected {
                reason: "Login failed for user alice".to_string(),
            };
            write_packet(&mut server_end, &rejected).await.unwrap();
        });

        match Client::handshake(client_end, "alice", "wrong").await {
            Err(ClientError::LoginRejected(reason)) => assert!(reason.contains("alice")),
            Err(e) => panic!("Expected rejection, got {}", e),
            Ok(_) => panic!("Expected rejection, got a session"),
        }
    }

    #[tokio::test]
    async fn test_handshake_server_hangs_up() {
        let (client_end, mut server_end) = tokio::io::duplex(4096);

        tokio::spawn(async move {
            let _ = read_packet(&mut server_end).await;
        });

        let result = Client::handshake(client_end, "alice", "pw1").await;
        assert!(matches!(result, Err(ClientError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_send_writes_chat_and_skips_blank_lines() {
        let (client_end, mut server_end) = tokio::io::duplex(4096);

        let server = tokio::spawn(async move {
            expect_login(&mut server_end, "alice", "pw1").await;
            let accepted = Packet::LoginAccepted {
                user: "alice".to_string(),
            };
            write_packet(&mut server_end, &accepted).await.unwrap();

            let mut received = Vec::new();
            while let Some(packet) = read_packet(&mut server_end).await.unwrap() {
                received.push(packet);
            }
            received
        });

        let mut client = Client::handshake(client_end, "alice", "pw1").await.unwrap();
        client.send("hi").await.unwrap();
        client.send("   ").await.unwrap();
        client.send("").await.unwrap();
        client.send("bye").await.unwrap();
        client.close().await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(
            received,
            vec![
                Packet::Chat {
                    text: "hi".to_string()
                },
                Packet::Chat {
                    text: "bye".to_string()
                },
            ]
        );
    }
}
