//! Property-based tests for the playback loop.
//! Verifies invariants hold for arbitrary files and command timings.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use platform::mocks::{MockDecoder, MockStorage};
use platform::vs1053::SCI_VOL;
use platform::Storage;
use playback::{PlaybackState, Player, PlayerConfig, Tick, TransportCommand, VolumeState};
use proptest::prelude::*;

fn block_on<F: core::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(f)
}

fn command() -> impl Strategy<Value = Option<TransportCommand>> {
    prop_oneof![
        4 => Just(None),
        1 => Just(Some(TransportCommand::TogglePlayPause)),
        1 => Just(Some(TransportCommand::Stop)),
        1 => Just(Some(TransportCommand::VolumeUp)),
        1 => Just(Some(TransportCommand::ToggleFastForward)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// While feeding, the offset never goes backwards (except through a
    /// Stop rewind) and never passes the file size; every audio chunk the
    /// decoder sees is at most 32 bytes.
    #[test]
    fn offset_is_monotonic_and_chunks_are_bounded(
        size in 0usize..6000,
        budget in 32usize..1500,
        commands in proptest::collection::vec(command(), 0..40),
    ) {
        block_on(async {
            let data = vec![0x11u8; size];
            let mut storage = MockStorage::new().with_file("/T.MP3", &data);
            let file = storage.open_file("/T.MP3").await.unwrap();
            let mut dec = MockDecoder::new().cancel_ack_after(Some(3));
            let mut volume = VolumeState::new();
            let config = PlayerConfig { max_bytes_per_tick: budget, ..PlayerConfig::default() };
            let mut player = Player::open(file, &mut dec, config).unwrap();

            let mut last = 0u64;
            let mut commands = commands.into_iter();
            let mut ticks = 0;
            while player.tick(&mut dec).await.unwrap() != Tick::Finished {
                let offset = player.session().offset();
                prop_assert!(offset <= size as u64);
                if offset < last {
                    prop_assert_eq!(offset, 0, "only a rewind moves the offset back");
                }
                last = offset;
                let cmd = match commands.next() {
                    Some(cmd) => cmd,
                    None if matches!(player.state(), PlaybackState::Paused | PlaybackState::Stopped) => {
                        Some(TransportCommand::TogglePlayPause)
                    }
                    None => None,
                };
                if let Some(cmd) = cmd {
                    player.command(cmd, &mut volume, &mut dec).unwrap();
                }
                ticks += 1;
                prop_assert!(ticks < 1000);
            }
            prop_assert!(dec.chunk_lens().iter().all(|&n| n > 0 && n <= 32));
            player.finish(&mut dec, &mut volume).unwrap();
            prop_assert!(dec.chunk_lens().iter().all(|&n| n > 0 && n <= 32));
            Ok(())
        })?;
    }

    /// Volume stays within bounds and a mute round trip restores the
    /// audible register exactly.
    #[test]
    fn volume_bounds_and_mute_round_trip(ups in 0usize..400, downs in 0usize..400) {
        let mut dec = MockDecoder::new();
        let mut volume = VolumeState::new();
        for _ in 0..ups {
            volume.volume_up(&mut dec).unwrap();
        }
        for _ in 0..downs {
            volume.volume_down(&mut dec).unwrap();
        }
        prop_assert!(volume.level() >= 0x40 && volume.level() <= 0xFD);
        prop_assert_eq!(u16::from(volume.step()) + u16::from(volume.level()), 255);

        let audible = volume.register_value();
        volume.toggle_mute(&mut dec).unwrap();
        volume.toggle_mute(&mut dec).unwrap();
        prop_assert_eq!(dec.register(SCI_VOL), audible);
    }
}
