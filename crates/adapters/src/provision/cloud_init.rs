// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cloud-init user data for new instances.
//!
//! The instance writes its settings to `/etc/bloom/env`, runs a heartbeat
//! loop that reports idleness and requests its own idle-timeout teardown,
//! and announces readiness with its provider id and public address.

use bloom_core::SessionId;

const TEMPLATE: &str = r#"#cloud-config
package_update: true
package_upgrade: false

packages:
  - git
  - tmux
  - jq
  - curl

write_files:
  - path: /etc/bloom/env
    permissions: '0600'
    content: |
      SESSION_ID=@SESSION_ID@
      WEBHOOK_URL=@WEBHOOK_URL@
      WEBHOOK_SECRET=@WEBHOOK_SECRET@
      IDLE_TIMEOUT=@IDLE_TIMEOUT@

  - path: /opt/bloom/daemon.sh
    permissions: '0755'
    content: |
      #!/bin/bash
      set -a
      source /etc/bloom/env
      set +a

      last_activity=$(date +%s)

      post() {
        curl -s -X POST "${WEBHOOK_URL}/webhook/$1" \
          -H "Authorization: Bearer ${WEBHOOK_SECRET}" \
          -H "Content-Type: application/json" \
          -d "$2" || true
      }

      while true; do
        if [ -f /tmp/bloom-last-activity ]; then
          last_activity=$(cat /tmp/bloom-last-activity)
        fi
        idle_seconds=$(($(date +%s) - last_activity))
        post heartbeat "{\"state\": \"running\", \"idleSeconds\": ${idle_seconds}, \"timestamp\": \"$(date -Iseconds)\"}"

        if [ "$idle_seconds" -ge "$IDLE_TIMEOUT" ]; then
          post idle-timeout "{\"timestamp\": \"$(date -Iseconds)\"}"
          exit 0
        fi
        sleep 30
      done

  - path: /etc/systemd/system/bloom-daemon.service
    content: |
      [Unit]
      Description=Bloom Daemon
      After=network.target

      [Service]
      Type=simple
      ExecStart=/opt/bloom/daemon.sh
      Restart=always

      [Install]
      WantedBy=multi-user.target

runcmd:
  - mkdir -p /workspace
  - systemctl daemon-reload
  - systemctl enable --now bloom-daemon
  - |
    VPS_IP=$(curl -s http://169.254.169.254/hetzner/v1/metadata/public-ipv4)
    SERVER_ID=$(curl -s http://169.254.169.254/hetzner/v1/metadata/instance-id)
    curl -X POST "@WEBHOOK_URL@/webhook/ready" \
      -H "Authorization: Bearer @WEBHOOK_SECRET@" \
      -H "Content-Type: application/json" \
      -d "{\"serverId\": \"$SERVER_ID\", \"ip\": \"$VPS_IP\"}"
"#;

/// Settings baked into the instance at boot.
#[derive(Debug, Clone)]
pub struct CloudInit<'a> {
    pub session_id: &'a SessionId,
    pub webhook_url: &'a str,
    pub webhook_secret: &'a str,
    pub idle_timeout_secs: u64,
}

impl CloudInit<'_> {
    pub fn render(&self) -> String {
        // Values land in an env file and a YAML block; strip anything that
        // could end a line early.
        let clean = |s: &str| s.chars().filter(|c| !c.is_control()).collect::<String>();
        TEMPLATE
            .replace("@SESSION_ID@", &clean(self.session_id.as_str()))
            .replace("@WEBHOOK_URL@", clean(self.webhook_url).trim_end_matches('/'))
            .replace("@WEBHOOK_SECRET@", &clean(self.webhook_secret))
            .replace("@IDLE_TIMEOUT@", &self.idle_timeout_secs.to_string())
    }
}

#[cfg(test)]
#[path = "cloud_init_tests.rs"]
mod tests;
