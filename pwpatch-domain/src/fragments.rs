//! Fixed content injected by the patches. These strings are consumed by other tooling (compose,
//! CircleCI, the Playwright test harness) and must stay byte-for-byte stable.

use serde_yaml::{Mapping, Value};

pub const SERVICE_NAME: &str = "playwright";
pub const DEFAULT_SERVICE_ANCHOR: &str = "chrome";

pub const STEP_NAME: &str = "Test with Playwright";
pub const DEFAULT_STEP_ANCHOR: &str = "Test with Behat";
pub const DEFAULT_ARTIFACT_STEP: &str = "Process test logs and artifacts";
pub const STEP_TIMEOUT: &str = "30m";

/// Presence of this text in the artifact step's command means the fragment is already there.
pub const ARTIFACT_MARKER: &str = "Playwright artifacts";

pub const STEP_COMMAND: &str = r#"set -e
echo "Preparing Playwright test environment..."

# Create test users
echo "Creating test users..."
docker compose exec -T cli ./tests/playwright/setup-test-users.sh

# Install Playwright dependencies and browsers
echo "Installing Playwright dependencies..."
docker compose exec -T playwright bash -c "mkdir -p /app/.logs/screenshots && cd /app/tests/playwright && npm ci"
docker compose exec -T playwright bash -c "cd /app/tests/playwright && npx playwright install --with-deps chromium firefox"

echo "Playwright test environment is ready!"

# Run Playwright tests with proper environment variable
echo "Running Playwright tests..."
docker compose exec -T -e PLAYWRIGHT_BASE_URL=http://nginx:8080 playwright bash -c "cd /app/tests/playwright && npm test""#;

pub const ARTIFACT_COLLECTION: &str = r#"

# Collect Playwright artifacts
if docker compose ps --services --filter "status=running" | grep -q playwright; then
  echo "Collecting Playwright test artifacts..."
  mkdir -p "${DREVOPS_CI_ARTIFACTS}/screenshots"
  docker compose cp playwright:/app/.logs/screenshots/. "${DREVOPS_CI_ARTIFACTS}/screenshots/" 2>/dev/null || true
  docker compose cp playwright:/app/.logs/playwright/. "${DREVOPS_CI_ARTIFACTS}/playwright/" 2>/dev/null || true
fi"#;

const LOCALDEV_URL: &str =
    "${DREVOPS_LOCALDEV_URL:-${COMPOSE_PROJECT_NAME:-drupal}.docker.amazee.io}";

fn mapping<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    let mut m = Mapping::with_capacity(N);
    for (k, v) in pairs {
        m.insert(Value::String(k.to_string()), v);
    }
    Value::Mapping(m)
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

fn list(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| text(s)).collect())
}

/// The `playwright` compose service definition.
pub fn playwright_service() -> Value {
    mapping([
        (
            "build",
            mapping([
                ("context", text(".")),
                ("dockerfile", text(".docker/playwright.dockerfile")),
            ]),
        ),
        (
            "volumes",
            list(&[
                ".:/app:${VOLUME_FLAGS:-delegated}",
                "./web/sites/default/files:/app/web/sites/default/files:${VOLUME_FLAGS:-delegated}",
            ]),
        ),
        ("user", text("root")),
        (
            "environment",
            mapping([
                ("TZ", text("${DREVOPS_TZ:-Australia/Melbourne}")),
                ("DREVOPS_LOCALDEV_URL", text(LOCALDEV_URL)),
                ("PLAYWRIGHT_HEADLESS", text("true")),
                (
                    "PLAYWRIGHT_CHROMIUM_ARGS",
                    text("--no-sandbox --disable-setuid-sandbox"),
                ),
                ("CI", text("${CI:-}")),
                ("PLAYWRIGHT_BASE_URL", text("http://nginx:8080")),
            ]),
        ),
        ("depends_on", list(&["nginx", "php"])),
        ("working_dir", text("/app")),
        ("command", text("tail -f /dev/null")),
        ("networks", list(&["default"])),
        ("labels", mapping([("lagoon.type", text("none"))])),
    ])
}

/// The "Test with Playwright" CircleCI step.
pub fn playwright_step() -> Value {
    mapping([(
        "run",
        mapping([
            ("name", text(STEP_NAME)),
            ("command", text(STEP_COMMAND)),
            ("no_output_timeout", text(STEP_TIMEOUT)),
        ]),
    )])
}
