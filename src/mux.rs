//! The request/response multiplexer (spec §4.C): the only writer of the byte
//! transport and the only reader of parsed frames. Generalizes
//! `examples/snorp-plm-rs/src/broker.rs`'s `Broker`/`event_loop` from a
//! single fire-and-forget listener list into filtered subscriptions, NAK
//! retry, and a dedicated all-linking-completion waiter registry.

use std::path::Path;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use futures::{
    channel::{
        mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    future::FutureExt,
    select,
    sink::SinkExt,
    stream::StreamExt,
};
use log::{debug, warn};

use tokio_util::codec::Framed;

use futures_timer::Delay;

use crate::error::Error;
use crate::frame::{AllLinkComplete, Frame};
use crate::frame::FrameCodec;
use crate::transport::ByteTransport;

const NUM_RETRIES: u8 = 20;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

type SubscriberId = u64;
type WaiterId = u64;

enum Command {
    WriteRead {
        frame: Frame,
        accepted: Vec<u8>,
        retry_delay: Duration,
        responder: oneshot::Sender<Result<Frame, Error>>,
    },
    Subscribe {
        codes: Vec<u8>,
        sender: UnboundedSender<Frame>,
        id_responder: oneshot::Sender<SubscriberId>,
    },
    Unsubscribe(SubscriberId),
    WaitAllLinkingCompleted {
        responder: oneshot::Sender<AllLinkComplete>,
        id_responder: oneshot::Sender<WaiterId>,
    },
    CancelAllLinkingWait(WaiterId),
}

struct Subscriber {
    id: SubscriberId,
    codes: Vec<u8>,
    sender: UnboundedSender<Frame>,
}

/// Handle to the multiplexer's event loop. Cheaply cloneable; every clone
/// shares the same underlying reader/writer task.
#[derive(Clone)]
pub struct Multiplexer {
    commands: UnboundedSender<Command>,
}

impl Multiplexer {
    /// Opens the serial port at `url` on a dedicated OS thread running its
    /// own single-threaded runtime, and spawns the event loop on it. This is
    /// the multiplexer's own analog of
    /// `examples/snorp-plm-rs/src/broker.rs`'s `Broker::from_path`: the
    /// calling thread blocks only long enough to learn whether the port
    /// opened, via a `std::sync::mpsc` handshake.
    ///
    /// Returns the multiplexer handle plus the thread's `JoinHandle`, so a
    /// caller that drops every clone of the handle (closing the command
    /// channel) can subsequently join the thread to know the reader has
    /// fully stopped (spec §3 "PLM state", `close()`).
    pub fn open(
        url: impl AsRef<Path> + Send + 'static,
    ) -> std::io::Result<(Multiplexer, thread::JoinHandle<()>)> {
        let (commands, receiver) = unbounded();
        let (init_tx, init_rx) = std_mpsc::channel();

        let handle = thread::spawn(move || {
            let mut rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
            rt.block_on(async move {
                match crate::transport::open(url.as_ref()) {
                    Ok(port) => {
                        let _ = init_tx.send(Ok(()));
                        let framed = Framed::new(port, FrameCodec);
                        event_loop(receiver, framed).await;
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                    }
                }
            });
        });

        init_rx
            .recv()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "reader thread died"))??;

        Ok((Multiplexer { commands }, handle))
    }

    /// Spawns the event loop task over `transport`, consuming it. The task
    /// runs on whatever executor `tokio::spawn` is called from; callers that
    /// want a dedicated OS thread (e.g. wrapping a blocking serial handle)
    /// should spawn their own `tokio::runtime::Runtime` and call this from
    /// within it, as `Broker::from_path` does for its thread.
    pub fn spawn<T>(transport: T) -> Multiplexer
    where
        T: ByteTransport,
    {
        let (commands, receiver) = unbounded();
        let framed = Framed::new(transport, FrameCodec);
        tokio::spawn(event_loop(receiver, framed));
        Multiplexer { commands }
    }

    /// Sends `frame`, awaiting the first inbound frame whose command byte is
    /// in `accepted`. Frames seen in the meantime that don't match are
    /// dispatched to subscribers as usual. A NAK epilogue on the command
    /// itself triggers a retry of the entire send after `retry_delay`.
    pub async fn write_read(
        &self,
        frame: Frame,
        accepted: &[u8],
        retry_delay: Duration,
    ) -> Result<Frame, Error> {
        let (responder, receiver) = oneshot::channel();
        self.commands
            .clone()
            .send(Command::WriteRead {
                frame,
                accepted: accepted.to_vec(),
                retry_delay,
                responder,
            })
            .await?;
        receiver.await.map_err(|_| Error::Disconnected)?
    }

    /// As [`write_read`](Self::write_read), with the default 500ms retry
    /// delay named in spec §4.C.
    pub async fn write_read_default(&self, frame: Frame, accepted: &[u8]) -> Result<Frame, Error> {
        self.write_read(frame, accepted, DEFAULT_RETRY_DELAY).await
    }

    /// Scoped subscription (spec §4.C `read(codes)`): returns a queue fed
    /// every frame whose command byte is in `codes`, for as long as the
    /// returned [`Subscription`] is alive. Dropping it unregisters the
    /// subscriber with guaranteed cleanup.
    pub async fn read(&self, codes: &[u8]) -> Result<Subscription, Error> {
        let (sender, receiver) = unbounded();
        let (id_responder, id_receiver) = oneshot::channel();
        self.commands
            .clone()
            .send(Command::Subscribe {
                codes: codes.to_vec(),
                sender,
                id_responder,
            })
            .await?;
        let id = id_receiver.await.map_err(|_| Error::Disconnected)?;
        Ok(Subscription {
            id,
            commands: self.commands.clone(),
            receiver,
        })
    }

    /// Convenience scope translating `0x50`/`0x51` frames into decoded
    /// [`InsteonMessage`](crate::message::InsteonMessage) values.
    pub async fn read_insteon_messages(&self) -> Result<MessageSubscription, Error> {
        use crate::constants::{EXTENDED_MESSAGE_RECEIVED, STANDARD_MESSAGE_RECEIVED};
        let inner = self
            .read(&[STANDARD_MESSAGE_RECEIVED, EXTENDED_MESSAGE_RECEIVED])
            .await?;
        Ok(MessageSubscription { inner })
    }

    /// Registers a one-shot waiter fulfilled on the next `0x53`
    /// (all-linking-completed) frame, independent of the general subscriber
    /// dispatch path. Cancellable: dropping the returned future before it
    /// resolves unregisters the waiter without affecting the multiplexer.
    pub async fn wait_all_linking_completed(&self) -> Result<AllLinkComplete, Error> {
        let (responder, receiver) = oneshot::channel();
        let (id_responder, id_receiver) = oneshot::channel();
        self.commands
            .clone()
            .send(Command::WaitAllLinkingCompleted {
                responder,
                id_responder,
            })
            .await?;
        let id = id_receiver.await.map_err(|_| Error::Disconnected)?;
        let _guard = WaiterGuard {
            commands: self.commands.clone(),
            id,
        };
        receiver.await.map_err(|_| Error::Disconnected)
    }
}

/// A live scoped subscription. Unregisters itself from the multiplexer when
/// dropped (property 8, spec §8): "after a scoped `read()` exits... the
/// subscriber list contains no reference to its queue".
pub struct Subscription {
    id: SubscriberId,
    commands: UnboundedSender<Command>,
    receiver: UnboundedReceiver<Frame>,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<Frame> {
        self.receiver.next().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.commands.unbounded_send(Command::Unsubscribe(self.id));
    }
}

/// Like [`Subscription`], but yields decoded
/// [`InsteonMessage`](crate::message::InsteonMessage) values instead of raw
/// frames.
pub struct MessageSubscription {
    inner: Subscription,
}

impl MessageSubscription {
    pub async fn next(&mut self) -> Option<crate::message::InsteonMessage> {
        match self.inner.next().await? {
            Frame::MessageReceived(msg) => Some(msg),
            _ => None,
        }
    }
}

struct WaiterGuard {
    commands: UnboundedSender<Command>,
    id: WaiterId,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        let _ = self
            .commands
            .unbounded_send(Command::CancelAllLinkingWait(self.id));
    }
}

struct Waiter {
    id: WaiterId,
    responder: oneshot::Sender<AllLinkComplete>,
}

/// Delivers `frame` to every subscriber whose code set matches, and to the
/// all-linking waiter registry when applicable.
fn dispatch(subscribers: &mut Vec<Subscriber>, waiters: &mut Vec<Waiter>, frame: &Frame) {
    let code = frame.command_byte();

    subscribers.retain(|s| {
        if s.codes.contains(&code) {
            s.sender.unbounded_send(frame.clone()).is_ok()
        } else {
            true
        }
    });

    if let Frame::AllLinkingCompleted(complete) = frame {
        for waiter in waiters.drain(..) {
            let _ = waiter.responder.send(complete.clone());
        }
    }
}

async fn event_loop<T>(
    mut commands: UnboundedReceiver<Command>,
    mut framed: Framed<T, FrameCodec>,
) where
    T: ByteTransport,
{
    let mut subscribers: Vec<Subscriber> = Vec::new();
    let mut waiters: Vec<Waiter> = Vec::new();
    let mut next_subscriber_id: SubscriberId = 0;
    let mut next_waiter_id: WaiterId = 0;

    loop {
        select! {
            maybe_frame = framed.next().fuse() => match maybe_frame {
                Some(Ok(frame)) => {
                    debug!("received frame: {:02x?}", frame);
                    dispatch(&mut subscribers, &mut waiters, &frame);
                }
                Some(Err(Error::NotAcknowledged)) => {
                    warn!("received unsolicited NAK, ignoring");
                }
                Some(Err(e)) => {
                    warn!("frame decode error: {:?}", e);
                }
                None => break,
            },
            cmd = commands.next() => match cmd {
                Some(Command::Subscribe { codes, sender, id_responder }) => {
                    let id = next_subscriber_id;
                    next_subscriber_id += 1;
                    subscribers.push(Subscriber { id, codes, sender });
                    let _ = id_responder.send(id);
                }
                Some(Command::Unsubscribe(id)) => {
                    subscribers.retain(|s| s.id != id);
                }
                Some(Command::WaitAllLinkingCompleted { responder, id_responder }) => {
                    let id = next_waiter_id;
                    next_waiter_id += 1;
                    waiters.push(Waiter { id, responder });
                    let _ = id_responder.send(id);
                }
                Some(Command::CancelAllLinkingWait(id)) => {
                    waiters.retain(|w| w.id != id);
                }
                Some(Command::WriteRead { frame, accepted, retry_delay, responder }) => {
                    let result = write_read_inner(
                        &mut framed,
                        &mut subscribers,
                        &mut waiters,
                        frame,
                        &accepted,
                        retry_delay,
                    )
                    .await;
                    let _ = responder.send(result);
                }
                None => break,
            },
        }
    }
}

/// Performs one full write-then-await-response sequence under the implicit
/// write-exclusion lock of owning `framed` exclusively within the event
/// loop: sends `frame`, then reads frames one at a time, dispatching
/// anything not in `accepted` to subscribers, until a matching frame
/// arrives. A NAK epilogue on the command itself re-sends the whole frame
/// after `retry_delay`, up to a bounded number of attempts.
async fn write_read_inner<T>(
    framed: &mut Framed<T, FrameCodec>,
    subscribers: &mut Vec<Subscriber>,
    waiters: &mut Vec<Waiter>,
    frame: Frame,
    accepted: &[u8],
    retry_delay: Duration,
) -> Result<Frame, Error>
where
    T: ByteTransport,
{
    let mut retries_left = NUM_RETRIES;

    'retry: loop {
        debug!("sending frame: {:02x?}", frame);
        framed.send(frame.clone()).await?;

        loop {
            match framed.next().await {
                None => return Err(Error::Disconnected),
                Some(Err(Error::NotAcknowledged)) => {
                    if retries_left == 0 {
                        return Err(Error::NotAcknowledged);
                    }
                    retries_left -= 1;
                    warn!("frame not acknowledged, retrying after {:?}", retry_delay);
                    Delay::new(retry_delay).await;
                    continue 'retry;
                }
                Some(Err(e)) => return Err(e),
                Some(Ok(reply)) => {
                    if accepted.contains(&reply.command_byte()) {
                        return Ok(reply);
                    }
                    dispatch(subscribers, waiters, &reply);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    use crate::constants::*;
    use crate::frame::AllLinkMode;

    #[tokio::test]
    async fn write_read_round_trips_get_info() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 2];
            fake_modem.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, [0x02, GET_IM_INFO]);
            fake_modem
                .write_all(&[0x02, GET_IM_INFO, 0x1A, 0x2B, 0x3C, 0x03, 0x2A, 0x07, ACK])
                .await
                .unwrap();
        });

        let mux = Multiplexer::spawn(host);
        match mux
            .write_read_default(Frame::GetImInfo, &[GET_IM_INFO])
            .await
            .unwrap()
        {
            Frame::ImInfo(info) => assert_eq!(info.firmware_version, 0x07),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[tokio::test]
    async fn write_read_retries_entire_send_after_nak() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 2];
            fake_modem.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, [0x02, CANCEL_ALL_LINKING]);
            fake_modem
                .write_all(&[0x02, CANCEL_ALL_LINKING, NAK])
                .await
                .unwrap();

            fake_modem.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, [0x02, CANCEL_ALL_LINKING]);
            fake_modem
                .write_all(&[0x02, CANCEL_ALL_LINKING, ACK])
                .await
                .unwrap();
        });

        let mux = Multiplexer::spawn(host);
        mux.write_read(
            Frame::CancelAllLinking,
            &[CANCEL_ALL_LINKING],
            Duration::from_millis(5),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn scoped_read_receives_unsolicited_frames() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        let mux = Multiplexer::spawn(host);
        let mut sub = mux.read(&[USER_RESET_DETECTED]).await.unwrap();

        fake_modem
            .write_all(&[0x02, USER_RESET_DETECTED])
            .await
            .unwrap();

        assert_eq!(sub.next().await, Some(Frame::UserResetDetected));
    }

    #[tokio::test]
    async fn wait_all_linking_completed_resolves_on_0x53() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        let mux = Multiplexer::spawn(host);

        let waiting = mux.wait_all_linking_completed();
        tokio::pin!(waiting);

        fake_modem
            .write_all(&[
                0x02,
                ALL_LINKING_COMPLETED,
                LINK_MODE_CONTROLLER,
                0x01,
                0xAA,
                0xBB,
                0xCC,
                0x01,
                0x02,
                0x03,
            ])
            .await
            .unwrap();

        let complete = waiting.await.unwrap();
        assert_eq!(complete.group, 1);
        assert_eq!(complete.mode, Some(AllLinkMode::Controller));
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_affect_a_later_one() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        let mux = Multiplexer::spawn(host);

        {
            let first = mux.wait_all_linking_completed();
            tokio::pin!(first);
            // Poll once to register, then drop: must unregister cleanly.
            let _ = futures::poll!(&mut first);
        }

        let second = mux.wait_all_linking_completed();
        tokio::pin!(second);
        let _ = futures::poll!(&mut second);

        fake_modem
            .write_all(&[
                0x02,
                ALL_LINKING_COMPLETED,
                LINK_MODE_AUTO,
                0x02,
                0x11,
                0x22,
                0x33,
                0x04,
                0x05,
                0x06,
            ])
            .await
            .unwrap();

        let complete = second.await.unwrap();
        assert_eq!(complete.group, 2);
    }
}
