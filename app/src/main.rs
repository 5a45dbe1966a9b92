mod config;
mod persona;
mod ui;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use ringbuf::traits::{Consumer, Producer, Split};
use rubato::Resampler;
use tracing_subscriber::fmt::time::ChronoLocal;

use gemini_live::types::{InterviewStatus, SessionConfig, SessionEvent};
use gemini_live::utils::audio::{CAPTURE_SAMPLE_RATE, PLAYBACK_SAMPLE_RATE};
use gemini_live::utils::spectrum::SpectrumAnalyzer;
use gemini_live::utils::{audio, device};
use gemini_live::{ClientTx, InterviewSession, PlayoutCommand};

use crate::config::{Config, INPUT_CHUNK_SIZE, OUTPUT_CHUNK_SIZE, OUTPUT_LATENCY_MS};

#[derive(Parser)]
#[command(about = "Voice interview simulator: interview an AI candidate")]
struct Cli {
    /// Capture device name (defaults to the system input)
    #[arg(long)]
    input_device: Option<String>,

    /// Playback device name (defaults to the system output)
    #[arg(long)]
    output_device: Option<String>,

    /// List audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

/// Result of one background connect attempt, tagged with the session
/// generation it belongs to so stale attempts are discarded.
type ConnectOutcome = (u64, Result<ClientTx, String>);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    // The terminal is owned by the UI; logs go to stderr so they can be
    // redirected to a file.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Cli::parse();
    if args.list_devices {
        println!("input devices:\n{}", device::list_inputs()?);
        println!("output devices:\n{}", device::list_outputs()?);
        return Ok(());
    }

    // --- Capture graph ---

    let (capture_tx, mut capture_rx) = tokio::sync::mpsc::channel::<Vec<f32>>(64);

    let input = device::get_or_default_input(args.input_device.clone())
        .context("Failed to get audio input device")?;
    tracing::info!("using input device: {:?}", input.name()?);

    let input_config = input
        .default_input_config()
        .context("Failed to get default input config")?;
    let input_config = StreamConfig {
        channels: input_config.channels(),
        sample_rate: input_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };
    let input_channel_count = input_config.channels as usize;
    let input_sample_rate = input_config.sample_rate.0 as f64;
    tracing::info!("input stream config: {:?}", &input_config);

    // Downmix to mono and hand blocks to the runtime; a full channel
    // drops the block rather than stalling the audio thread.
    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let block = if input_channel_count > 1 {
            data.chunks(input_channel_count)
                .map(|c| c.iter().sum::<f32>() / input_channel_count as f32)
                .collect::<Vec<f32>>()
        } else {
            data.to_vec()
        };
        if let Err(e) = capture_tx.try_send(block) {
            tracing::debug!("dropping capture block: {:?}", e);
        }
    };
    let input_stream = input.build_input_stream(
        &input_config,
        input_data_fn,
        move |err| tracing::error!("input stream error: {}", err),
        None,
    )?;
    input_stream.play()?;

    // --- Playback graph ---

    let output = device::get_or_default_output(args.output_device.clone())
        .context("Failed to get audio output device")?;
    tracing::info!("using output device: {:?}", output.name()?);

    let output_config = output
        .default_output_config()
        .context("Failed to get default output config")?;
    let output_config = StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };
    let output_channel_count = output_config.channels as usize;
    let output_sample_rate = output_config.sample_rate.0 as f64;
    tracing::info!("output stream config: {:?}", &output_config);

    let out_buffer =
        audio::shared_buffer(output_sample_rate as usize * OUTPUT_LATENCY_MS / 1000);
    let (mut out_producer, mut out_consumer) = out_buffer.split();

    // Barge-in: the playout task raises the flag, the output callback
    // drains everything still queued before filling the next block.
    let flush_flag = Arc::new(AtomicBool::new(false));
    // Output clock: mono frames the device has consumed.
    let frames_played = Arc::new(AtomicU64::new(0));
    let analyzer = Arc::new(Mutex::new(SpectrumAnalyzer::default()));

    let flush_for_output = flush_flag.clone();
    let frames_for_output = frames_played.clone();
    let analyzer_for_output = analyzer.clone();
    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        if flush_for_output.swap(false, Ordering::AcqRel) {
            while out_consumer.try_pop().is_some() {}
        }

        let frame_count = data.len() / output_channel_count;
        let mut played = Vec::with_capacity(frame_count);
        let mut sample_index = 0;
        while sample_index < data.len() {
            let sample = out_consumer.try_pop().unwrap_or(0.0);
            played.push(sample);

            // Duplicate the mono sample on the first two channels.
            if sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            if output_channel_count > 1 && sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            sample_index += output_channel_count.saturating_sub(2);
        }

        frames_for_output.fetch_add(frame_count as u64, Ordering::Relaxed);
        if let Ok(mut analyzer) = analyzer_for_output.try_lock() {
            analyzer.push_samples(&played);
        }
    };
    let output_stream = output.build_output_stream(
        &output_config,
        output_data_fn,
        move |err| tracing::error!("output stream error: {}", err),
        None,
    )?;
    output_stream.play()?;

    // --- Playout task: decoded chunks -> resample -> ring buffer ---

    let (playout_tx, mut playout_rx) = tokio::sync::mpsc::channel::<PlayoutCommand>(256);
    let flush_for_playout = flush_flag.clone();
    let mut out_resampler =
        audio::create_resampler(PLAYBACK_SAMPLE_RATE, output_sample_rate, 100)
            .context("Failed to create resampler for playback")?;

    let playout_task = tokio::spawn(async move {
        while let Some(command) = playout_rx.recv().await {
            match command {
                PlayoutCommand::Play { samples, .. } => {
                    // Let a pending flush land before queueing new audio,
                    // so post-interruption chunks are not swept with it.
                    while flush_for_playout.load(Ordering::Acquire) {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                    let chunk_size = out_resampler.input_frames_next();
                    for chunk in audio::split_for_chunks(&samples, chunk_size) {
                        if let Ok(resampled) = out_resampler.process(&[chunk.as_slice()], None) {
                            if let Some(resampled) = resampled.first() {
                                for &sample in resampled {
                                    if out_producer.try_push(sample).is_err() {
                                        tracing::warn!("playout buffer full, dropping sample");
                                    }
                                }
                            }
                        }
                    }
                }
                PlayoutCommand::Flush => {
                    flush_for_playout.store(true, Ordering::Release);
                }
            }
        }
    });

    // --- Session plumbing ---

    let mut session = InterviewSession::new();
    let mut generation: u64 = 0;

    let (connect_tx, mut connect_rx) = tokio::sync::mpsc::channel::<ConnectOutcome>(4);
    let (session_events_tx, mut session_events_rx) =
        tokio::sync::mpsc::channel::<(u64, SessionEvent)>(256);

    let mut in_resampler =
        audio::create_resampler(input_sample_rate, CAPTURE_SAMPLE_RATE, INPUT_CHUNK_SIZE)
            .context("Failed to create resampler for capture")?;
    let mut capture_buffer: VecDeque<f32> = VecDeque::with_capacity(INPUT_CHUNK_SIZE * 2);

    let mut tui = ui::Tui::new()?;
    let mut ticker = tokio::time::interval(Duration::from_millis(33));
    let mut was_listening = false;

    let clock = {
        let frames = frames_played.clone();
        move || frames.load(Ordering::Relaxed) as f64 / output_sample_rate
    };

    'main: loop {
        tokio::select! {
            _ = ticker.tick() => {
                while crossterm::event::poll(Duration::ZERO)? {
                    let event = crossterm::event::read()?;
                    let Event::Key(key) = event else { continue };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            session.stop();
                            break 'main;
                        }
                        KeyCode::Char(' ') => {
                            if session.status() == InterviewStatus::Listening {
                                session.stop();
                            } else if session.status().can_start() {
                                generation += 1;
                                start_session(
                                    &mut session,
                                    &config,
                                    generation,
                                    playout_tx.clone(),
                                    connect_tx.clone(),
                                    session_events_tx.clone(),
                                );
                            }
                        }
                        _ => {}
                    }
                }

                session.reclaim_finished(clock());

                let listening = session.status() == InterviewStatus::Listening;
                if was_listening && !listening {
                    if let Ok(mut analyzer) = analyzer.lock() {
                        analyzer.reset();
                    }
                }
                was_listening = listening;

                let bins = if listening {
                    analyzer.lock().ok().map(|mut a| a.byte_frequency_data())
                } else {
                    None
                };
                tui.draw(
                    session.status(),
                    session.last_error(),
                    session.transcript().turns(),
                    bins.as_deref(),
                )?;
            }

            Some(block) = capture_rx.recv() => {
                capture_buffer.extend(block);
                let mut resampled: Vec<f32> = Vec::new();
                while capture_buffer.len() >= INPUT_CHUNK_SIZE {
                    let chunk: Vec<f32> = capture_buffer.drain(..INPUT_CHUNK_SIZE).collect();
                    if let Ok(output) = in_resampler.process(&[chunk.as_slice()], None) {
                        if let Some(output) = output.first() {
                            resampled.extend(output.iter().copied());
                        }
                    }
                }
                if !resampled.is_empty() {
                    session.handle_capture_block(&resampled);
                }
            }

            Some((event_generation, outcome)) = connect_rx.recv() => {
                if event_generation == generation {
                    match outcome {
                        Ok(outbound) => session.wire_transport(outbound),
                        Err(message) => session.fail_setup(message),
                    }
                }
            }

            Some((event_generation, event)) = session_events_rx.recv() => {
                if event_generation == generation {
                    session.handle_event(event, clock());
                }
            }
        }
    }

    drop(tui);
    playout_task.abort();
    tracing::info!("shutting down");
    Ok(())
}

/// Moves the session to `Connecting` and resolves the live connection in
/// the background. The outcome and all session events come back tagged
/// with `generation`; anything from an older generation is discarded.
fn start_session(
    session: &mut InterviewSession,
    config: &Config,
    generation: u64,
    playout_tx: tokio::sync::mpsc::Sender<PlayoutCommand>,
    connect_tx: tokio::sync::mpsc::Sender<ConnectOutcome>,
    session_events_tx: tokio::sync::mpsc::Sender<(u64, SessionEvent)>,
) {
    if let Err(e) = session.begin(playout_tx) {
        tracing::warn!("cannot start interview: {}", e);
        return;
    }

    let client_config = gemini_live::Config::builder()
        .with_api_key(&config.api_key)
        .build();
    let session_config = SessionConfig::new()
        .with_model(&config.model)
        .with_audio_response(config.voice.clone())
        .with_system_instruction(&persona::system_instruction())
        .with_input_transcription_enable()
        .with_output_transcription_enable()
        .build();

    tokio::spawn(async move {
        let mut client = match gemini_live::connect_with_config(1024, client_config, session_config)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                let _ = connect_tx
                    .send((generation, Err(format!("Failed to start interview: {}", e))))
                    .await;
                return;
            }
        };

        let (events, outbound) = match (client.session_events(), client.sender()) {
            (Ok(events), Some(outbound)) => (events, outbound),
            _ => {
                let _ = connect_tx
                    .send((generation, Err("connection lost during setup".to_string())))
                    .await;
                return;
            }
        };
        // The clone handed to the orchestrator is now the only live
        // sender; dropping the client lets teardown close the socket.
        drop(client);
        let _ = connect_tx.send((generation, Ok(outbound))).await;

        let mut events = events;
        loop {
            match events.recv().await {
                Ok(event) => {
                    if session_events_tx.send((generation, event)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("session event stream lagged, skipped {}", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
