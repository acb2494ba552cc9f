use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;
use crate::core::SystemReport;
use crate::probe;

const SYSTEM_INSTRUCTION: &str = "Eres un experto en optimización de sistemas Windows. \
Analiza los datos del sistema y recomienda acciones específicas. \
Prioriza seguridad y estabilidad. Solo recomienda eliminar archivos si son claramente innecesarios. \
Evita recomendar eliminar: pagefile.sys, hiberfil.sys, swapfile.sys, archivos del sistema. \
Usa nombres de acciones compatibles: temp-cleanup, empty-recycle-bin, startup-optimize, \
browser-cache-cleanup, disk-analyze, run-native-cleanup, service-optimize, set-high-performance-power. \
La intensidad puede ser: baja, media, alta. \
Respuestas deben ser SOLO JSON sin texto adicional.";

const TASK_INSTRUCTION: &str = "Analiza el estado del sistema Windows y genera un plan de optimización JSON \
con acciones específicas. Considera: limpieza de archivos temporales, gestión de programas de inicio, \
análisis de disco. \
Formato de respuesta: {\"acciones\": [{\"tipo\": \"temp-cleanup\", \"intensidad\": \"media\"}, ...]} \
Asegúrate de que la respuesta es SOLO el JSON, sin ningún texto adicional. \
Usa SOLO los nombres de acciones compatibles.";

const LIVENESS_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    name: &'a str,
}

pub struct AdvisorClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    num_predict: u32,
    timeout: Duration,
    max_retries: u32,
}

impl AdvisorClient {
    pub fn new(cfg: &AdvisorConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .context("HTTPクライアントの初期化に失敗しました")?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            num_predict: cfg.num_predict,
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_retries: cfg.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_available(&self) -> bool {
        self.http
            .get(&self.endpoint)
            .timeout(LIVENESS_TIMEOUT)
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    pub fn model_installed(&self) -> bool {
        self.http
            .post(format!("{}/api/show", self.endpoint))
            .timeout(LIVENESS_TIMEOUT)
            .json(&ShowRequest { name: &self.model })
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    pub fn build_prompt(&self, report: &SystemReport) -> String {
        format!(
            "[SYS]{SYSTEM_INSTRUCTION}[/SYS]\n[INFO]{}[/INFO]\n[USER]{TASK_INSTRUCTION}",
            probe::render_for_prompt(report)
        )
    }

    pub fn fetch_plan_text(&self, report: &SystemReport) -> Result<String> {
        let prompt = self.build_prompt(report);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        };

        for attempt in 0..=self.max_retries {
            if !self.is_available() {
                return Err(anyhow!(
                    "推奨サービスが応答しません（{}）。`ollama serve` が起動しているか確認してください",
                    self.endpoint
                ));
            }

            let sent = self
                .http
                .post(format!("{}/api/generate", self.endpoint))
                .timeout(self.timeout)
                .json(&body)
                .send();

            match sent {
                Ok(resp) => {
                    let resp = resp
                        .error_for_status()
                        .context("推奨サービスがエラーを返しました")?;
                    let parsed: GenerateResponse = resp
                        .json()
                        .context("推奨サービスの応答(JSON)を解析できませんでした")?;
                    return Ok(parsed.response.trim().to_string());
                }
                Err(err) if err.is_timeout() => {
                    if attempt < self.max_retries {
                        std::thread::sleep(RETRY_DELAY);
                        continue;
                    }
                    return Err(anyhow!(
                        "推奨サービスへの要求がタイムアウトしました（{}秒 × {}回）",
                        self.timeout.as_secs(),
                        self.max_retries + 1
                    ));
                }
                Err(err) if err.is_connect() => {
                    return Err(anyhow!(
                        "推奨サービスに接続できませんでした（{}）。サービスは起動していますか？",
                        self.endpoint
                    ));
                }
                Err(err) => {
                    return Err(err).context("推奨サービスへの要求に失敗しました");
                }
            }
        }

        Err(anyhow!("推奨サービスへの要求に失敗しました"))
    }
}
