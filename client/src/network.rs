use crate::game::ClientView;
use crate::input::{parse_command, Command, RandomPolicy};
use crate::rendering::Renderer;
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::sleep;

/// Pause before the bot acts, so a human opponent can follow along.
const BOT_DELAY: Duration = Duration::from_millis(400);

/// The bot only acts on a fresh `STATE` or a `RESULT`. A `RESET` is always
/// followed by the opening `STATE`, so acting on both would move twice.
fn prompts_bot(message: &ServerMessage) -> bool {
    matches!(message, ServerMessage::State { .. } | ServerMessage::Result(_))
}

pub struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    view: ClientView,
    renderer: Renderer,
    bot: Option<RandomPolicy>,
}

impl Client {
    pub async fn connect(server_addr: &str, bot: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", server_addr);

        let (reader, writer) = stream.into_split();

        Ok(Client {
            lines: BufReader::new(reader).lines(),
            writer,
            view: ClientView::new(),
            renderer: Renderer,
            bot: bot.then(RandomPolicy::new),
        })
    }

    async fn send(&mut self, message: ClientMessage) -> Result<(), Box<dyn std::error::Error>> {
        debug!("Sending {}", message);
        self.writer.write_all(message.to_line().as_bytes()).await?;
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Option<ServerMessage> {
        match line.parse::<ServerMessage>() {
            Ok(message) => {
                self.view.apply_server_message(&message);
                self.renderer.render(&self.view);
                Some(message)
            }
            Err(e) => {
                warn!("Ignoring message from server: {}", e);
                None
            }
        }
    }

    /// Returns false when the player asked to quit.
    async fn handle_input(&mut self, line: &str) -> Result<bool, Box<dyn std::error::Error>> {
        match parse_command(line) {
            Some(Command::Play(position)) if self.view.can_play(position) => {
                self.send(ClientMessage::Move { position }).await?;
            }
            Some(Command::Play(position)) => {
                println!("Cannot play cell {} right now", position + 1);
            }
            Some(Command::Reset) if self.view.can_reset() => {
                self.send(ClientMessage::Reset).await?;
            }
            Some(Command::Reset) => println!("Only X can restart, and only after a match ends"),
            Some(Command::Quit) => return Ok(false),
            None => println!("Type 1-9 to play, r to restart, q to quit"),
        }
        Ok(true)
    }

    async fn act_as_bot(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(policy) = self.bot.as_mut() else {
            return Ok(());
        };

        if self.view.is_my_turn() {
            if let Some(position) = policy.choose(&self.view.board) {
                sleep(BOT_DELAY).await;
                self.send(ClientMessage::Move { position }).await?;
            }
        } else if self.view.can_reset() {
            sleep(BOT_DELAY * 3).await;
            self.send(ClientMessage::Reset).await?;
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Server closed the connection");
                        break;
                    };
                    let message = self.handle_line(&line);
                    if self.view.room_full {
                        break;
                    }
                    if message.as_ref().is_some_and(prompts_bot) {
                        self.act_as_bot().await?;
                    }
                },

                input = stdin.next_line(), if stdin_open => {
                    match input? {
                        Some(text) => {
                            if !self.handle_input(&text).await? {
                                break;
                            }
                        }
                        None => stdin_open = false,
                    }
                },
            }
        }

        let _ = self.writer.shutdown().await;
        Ok(())
    }
}
