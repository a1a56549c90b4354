use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use island_match::{
    AccountGateway, BotIdentity, ClientNotification, ClientNotifier, CreateTableRequest,
    GameGateway, GatewayError, Gateways, InMemoryRegistrar, Match, MatchConfig, MatchId, TableId,
    gateway::GatewayResult,
    matchmaking::{Table, TableIdPool},
};
use std::{hint::black_box, sync::Arc};

/// Collaborator that accepts everything
struct Accepting;

#[async_trait]
impl GameGateway for Accepting {
    async fn create_table(&self, _request: &CreateTableRequest) -> GatewayResult<()> {
        Ok(())
    }

    async fn add_player(&self, _: MatchId, _: TableId, _: &str, _: usize) -> GatewayResult<()> {
        Ok(())
    }

    async fn start_client(&self, _: MatchId, _: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn request_exit(&self, _: MatchId, _: TableId, _: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn push_net_state(&self, _: MatchId, _: TableId, _: &str, _: bool) -> GatewayResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AccountGateway for Accepting {
    async fn get_bot_identity(&self) -> GatewayResult<BotIdentity> {
        Err(GatewayError::Unavailable("no bots in benchmarks".to_string()))
    }
}

#[async_trait]
impl ClientNotifier for Accepting {
    async fn notify(&self, _: &str, _: ClientNotification) -> GatewayResult<()> {
        Ok(())
    }
}

fn gateways() -> Gateways {
    let accepting = Arc::new(Accepting);
    Gateways {
        registrar: Arc::new(InMemoryRegistrar::new()),
        game: accepting.clone(),
        accounts: accepting.clone(),
        notifier: accepting,
    }
}

/// Benchmark filling tables with a stream of signups
fn bench_signups(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("signup");

    for capacity in [2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_per_table", capacity)),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    rt.block_on(async {
                        let m = Arc::new(Match::new(
                            MatchConfig {
                                player_per_table: capacity,
                                ..MatchConfig::default()
                            },
                            gateways(),
                        ));
                        for i in 0..256 {
                            black_box(m.signup(&format!("p{}", i)).await.unwrap());
                        }
                    })
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a table forming and activating
fn bench_table_activation(c: &mut Criterion) {
    c.bench_function("table_form_and_activate", |b| {
        b.iter(|| {
            let mut table = Table::new(1, 8);
            for i in 0..8 {
                table.add_player(&format!("p{}", i)).unwrap();
            }
            black_box(table.activate().unwrap())
        });
    });
}

/// Benchmark id churn as tables close and reopen
fn bench_id_pool(c: &mut Criterion) {
    c.bench_function("table_id_lease_release", |b| {
        let mut pool = TableIdPool::new();
        b.iter(|| {
            let ids: Vec<_> = (0..64).map(|_| pool.lease()).collect();
            for id in ids.into_iter().rev() {
                pool.release(id);
            }
            black_box(pool.leased())
        });
    });
}

criterion_group!(formation, bench_signups, bench_table_activation);
criterion_group!(id_pool, bench_id_pool);
criterion_main!(formation, id_pool);
