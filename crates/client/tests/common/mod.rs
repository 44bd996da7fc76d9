use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use guguma_client::{ClientConfig, PlantApi, SubmissionPipeline};
use guguma_core::draft::PlantDraft;
use guguma_core::image_prep::ImagePreparer;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// One multipart field as received by the fake recognition endpoint.
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

/// One request body as received by the fake creation endpoint.
#[derive(Debug, Clone)]
pub struct CreateCall {
    pub content_type: Option<String>,
    pub body: String,
}

/// Everything the fake plant service has seen.
#[derive(Debug, Default)]
pub struct Recorder {
    recognize_hits: AtomicUsize,
    create_hits: AtomicUsize,
    parts: Mutex<Vec<UploadedPart>>,
    create_calls: Mutex<Vec<CreateCall>>,
}

impl Recorder {
    pub fn recognize_hits(&self) -> usize {
        self.recognize_hits.load(Ordering::SeqCst)
    }

    pub fn create_hits(&self) -> usize {
        self.create_hits.load(Ordering::SeqCst)
    }

    pub fn parts(&self) -> Vec<UploadedPart> {
        self.parts.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.create_calls.lock().unwrap().clone()
    }
}

/// Canned replies of the fake plant service.
#[derive(Debug, Clone)]
pub struct Replies {
    pub recognize: (StatusCode, String),
    pub create: (StatusCode, String),
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            recognize: (StatusCode::OK, "Monstera".into()),
            create: (StatusCode::CREATED, String::new()),
        }
    }
}

struct FakeService {
    recorder: Arc<Recorder>,
    replies: Replies,
}

async fn recognize(
    State(service): State<Arc<FakeService>>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    service.recorder.recognize_hits.fetch_add(1, Ordering::SeqCst);

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.unwrap().len();

        service.recorder.parts.lock().unwrap().push(UploadedPart {
            name,
            file_name,
            content_type,
            size,
        });
    }

    service.replies.recognize.clone()
}

async fn create(
    State(service): State<Arc<FakeService>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    service.recorder.create_hits.fetch_add(1, Ordering::SeqCst);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    service
        .recorder
        .create_calls
        .lock()
        .unwrap()
        .push(CreateCall { content_type, body });

    service.replies.create.clone()
}

/// Start the fake plant service on an ephemeral port and return a pipeline
/// pointed at it.
pub async fn spawn_service(replies: Replies) -> (SubmissionPipeline, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let service = Arc::new(FakeService {
        recorder: Arc::clone(&recorder),
        replies,
    });

    let app = Router::new()
        .route("/recognize", post(recognize))
        .route("/plants", post(create))
        .with_state(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig::new(
        format!("http://{addr}/recognize"),
        format!("http://{addr}/plants"),
    );
    (test_pipeline(&config), recorder)
}

/// A pipeline whose endpoints point at a port nobody listens on.
pub fn unreachable_pipeline() -> SubmissionPipeline {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(
        format!("http://{addr}/recognize"),
        format!("http://{addr}/plants"),
    );
    test_pipeline(&config)
}

fn test_pipeline(config: &ClientConfig) -> SubmissionPipeline {
    let config = ClientConfig {
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..config.clone()
    };
    let api = PlantApi::new(&config).unwrap();
    SubmissionPipeline::new(api, ImagePreparer::default())
}

/// A small PNG, standing in for a photo from the image picker.
pub fn leaf_png() -> Vec<u8> {
    let image = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 90]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

pub fn complete_draft() -> PlantDraft {
    PlantDraft {
        image_uri: "file://x.jpg".into(),
        compressed_image: None,
        name: "Monstera".into(),
        nickname: "Sunny".into(),
        water_interval_days: 7,
        user_id: "abc-123".into(),
    }
}
