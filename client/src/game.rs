use shared::{PlayerId, PlayerView, Snapshot};

/// How many entries the periodic leaderboard log shows
pub const LEADERBOARD_SIZE: usize = 5;

/// Client-side view of the arena, refreshed from every state update
pub struct ClientGameState {
    player_id: PlayerId,
    latest: Option<Snapshot>,
    updates_received: u64,
}

impl ClientGameState {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            latest: None,
            updates_received: 0,
        }
    }

    /// Replaces the current view; older snapshots are never kept
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.latest = Some(snapshot);
        self.updates_received += 1;
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn updates_received(&self) -> u64 {
        self.updates_received
    }

    /// Our own blob, if the latest snapshot includes it
    pub fn own(&self) -> Option<&PlayerView> {
        self.latest.as_ref()?.players.get(&self.player_id)
    }

    pub fn time_left(&self) -> Option<u64> {
        self.latest.as_ref().map(|s| s.time_left)
    }

    pub fn is_over(&self) -> bool {
        self.latest.as_ref().map_or(false, Snapshot::is_over)
    }

    /// Leaderboard rendered as log lines, our own entry marked with `*`
    pub fn leaderboard_lines(&self) -> Vec<String> {
        let Some(snapshot) = self.latest.as_ref() else {
            return Vec::new();
        };

        snapshot
            .leaderboard(LEADERBOARD_SIZE)
            .into_iter()
            .enumerate()
            .map(|(rank, (id, view))| {
                let marker = if id == self.player_id { "*" } else { " " };
                format!("{}{}. {}: {}", marker, rank + 1, view.name, view.score)
            })
            .collect()
    }

    pub fn winner_line(&self) -> String {
        match self.latest.as_ref().and_then(Snapshot::winner) {
            Some((_, view)) => format!("Winner: {} with {} points!", view.name, view.score),
            None => "No players in the game!".to_string(),
        }
    }
}
