//! Google Translate speech backend against a mock HTTP server.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use emotive_speech::core::cache::CacheStatus;
use emotive_speech::core::emotion::{EmotionId, EmotionRegistry};
use emotive_speech::core::pipeline::{EffectParams, PipelineConfig, PipelineService};
use emotive_speech::core::synthesis::{GoogleTranslateSynthesizer, SynthesisClient};
use emotive_speech::errors::SpeechError;

fn client_for(server: &MockServer) -> GoogleTranslateSynthesizer {
    GoogleTranslateSynthesizer::new(
        &format!("{}/translate_tts", server.uri()),
        Duration::from_secs(2),
    )
    .unwrap()
}

/// A short 16-bit mono WAV body.
fn wav_body(frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 24_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for n in 0..frames {
            let sample = ((n as f32 * 0.07).sin() * 8_000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[tokio::test]
async fn test_request_carries_text_language_and_speed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .and(query_param("client", "tw-ob"))
        .and(query_param("tl", "pt"))
        .and(query_param("q", "Olá mundo"))
        .and(query_param("ttsspeed", "0.3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3-fake-mp3".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let audio = client.synthesize("Olá mundo", "pt_BR", true).await.unwrap();
    assert_eq!(&audio[..], b"ID3-fake-mp3");
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_status_codes_map_to_error_taxonomy() {
    let cases = [
        (429, "quota"),
        (400, "language"),
        (404, "language"),
        (500, "network"),
        (503, "network"),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let result = client_for(&server).synthesize("Hello", "en", false).await;
        let matched = match (&result, expected) {
            (Err(SpeechError::QuotaExceededUpstream(_)), "quota") => true,
            (Err(SpeechError::UnsupportedLanguage(lang)), "language") => lang == "en",
            (Err(SpeechError::NetworkError(_)), "network") => true,
            _ => false,
        };
        assert!(matched, "status {status} produced {result:?}");
    }
}

#[tokio::test]
async fn test_slow_response_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = GoogleTranslateSynthesizer::new(
        &format!("{}/translate_tts", server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();
    let result = client.synthesize("Hello", "en", false).await;
    assert!(matches!(result, Err(SpeechError::NetworkError(_))));
}

#[tokio::test]
async fn test_unsupported_language_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.synthesize("Hello", "xx-klingon", false).await;
    assert!(matches!(result, Err(SpeechError::UnsupportedLanguage(_))));
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn test_pipeline_splits_to_backend_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/wav")
                .set_body_bytes(wav_body(2_400)),
        )
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server));
    let pipeline = PipelineService::new(
        PipelineConfig::default(),
        Arc::new(EmotionRegistry::builtin()),
        client.clone(),
    )
    .unwrap();
    assert_eq!(pipeline.max_segment_chars(), 100);

    // One 230-character sentence with no clause marks
    let text = format!("{}.", "speech ".repeat(33).trim_end());
    let resolution = pipeline
        .resolve(&text, "EN", EmotionId::News, &EffectParams::default())
        .await
        .unwrap();

    assert_eq!(resolution.status, CacheStatus::Miss);
    assert_eq!(resolution.segments, 3);
    assert_eq!(client.request_count(), 3);

    let received = server.received_requests().await.unwrap();
    for request in &received {
        let q = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(q.chars().count() <= 100);
        assert!(request.url.query_pairs().any(|(k, v)| k == "tl" && v == "en"));
    }
}

#[tokio::test]
async fn test_pipeline_rejects_unknown_language_before_quota() {
    let server = MockServer::start().await;
    let client = Arc::new(client_for(&server));
    let pipeline = PipelineService::new(
        PipelineConfig::default(),
        Arc::new(EmotionRegistry::builtin()),
        client.clone(),
    )
    .unwrap();

    let result = pipeline
        .resolve("Hello.", "zz", EmotionId::Calm, &EffectParams::default())
        .await;
    assert!(matches!(result, Err(SpeechError::UnsupportedLanguage(_))));
    assert_eq!(pipeline.stats().quota.used, 0);
    assert_eq!(client.request_count(), 0);
}
