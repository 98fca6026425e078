// holodeck-core/src/playback/mod.rs
//
// Builds the decode instruction for one scene window and hands the
// resulting stream to the voice driver.

use std::path::Path;
use std::process::{Command, Stdio};

use songbird::input::{ChildContainer, Input};

use holodeck_common::error::Error;

/// Render milliseconds the way ffmpeg wants its `-ss`/`-t` arguments.
fn millis_arg(millis: i64) -> String {
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

/// Decode arguments for a clip window: seek before the input demuxes when
/// an offset is set (cheaper than decoding and dropping output), bound by
/// `-t` measured from the seek point (ffmpeg has no end-time flag), and
/// normalize loudness. WAV on stdout so the driver can probe it.
pub fn decode_args(audio_path: &Path, start_millis: i64, runtime_millis: i64) -> Vec<String> {
    let mut args: Vec<String> = vec!["-v".into(), "quiet".into()];
    if start_millis > 0 {
        args.push("-ss".into());
        args.push(millis_arg(start_millis));
    }
    args.push("-i".into());
    args.push(audio_path.to_string_lossy().into_owned());
    if runtime_millis > 0 {
        args.push("-t".into());
        args.push(millis_arg(runtime_millis));
    }
    args.extend([
        "-filter:a".into(),
        "loudnorm".into(),
        "-f".into(),
        "wav".into(),
        "-ar".into(),
        "48000".into(),
        "-ac".into(),
        "2".into(),
        "pipe:1".into(),
    ]);
    args
}

/// Spawn ffmpeg over the stored clip and wrap its stdout as a playable
/// input.
pub fn open_clip(audio_path: &Path, start_millis: i64, runtime_millis: i64) -> Result<Input, Error> {
    let child = Command::new("ffmpeg")
        .args(decode_args(audio_path, start_millis, runtime_millis))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(ChildContainer::from(child).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeks_before_input_and_bounds_by_duration() {
        let args = decode_args(Path::new("data/media/clip.webm"), 5_000, 15_000);

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input, "seek must happen before the input demuxes");
        assert_eq!(args[ss + 1], "5.000");

        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "15.000");
    }

    #[test]
    fn zero_offset_omits_the_seek() {
        let args = decode_args(Path::new("clip.webm"), 0, 15_000);
        assert!(!args.iter().any(|a| a == "-ss"));
    }

    #[test]
    fn zero_runtime_omits_the_bound() {
        let args = decode_args(Path::new("clip.webm"), 0, 0);
        assert!(!args.iter().any(|a| a == "-t"));
    }

    #[test]
    fn output_is_loudness_normalized() {
        let args = decode_args(Path::new("clip.webm"), 1_000, 2_500);
        let filter = args.iter().position(|a| a == "-filter:a").unwrap();
        assert_eq!(args[filter + 1], "loudnorm");
    }

    #[test]
    fn sub_second_offsets_keep_their_millis() {
        let args = decode_args(Path::new("clip.webm"), 1_234, 0);
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "1.234");
    }
}
