use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use luna_codegen::{compile, CompileOptions};
use luna_parser::parse;

const CLOSURES: &str = r#"
local count = 0
local function counter(step)
    return function()
        count = count + step
        return count
    end
end
local inc = counter(1)
for i = 1, 10 do inc() end
"#;

const TABLES: &str = r#"
local point = { x = 1, y = 2, 3, 4, [5] = 6 }
function point:move(dx, dy)
    self.x = self.x + dx
    self.y = self.y + dy
end
point:move(1, 2)
for k, v in pairs(point) do print(k, v) end
"#;

fn generated_locals(count: usize) -> String {
    (0..count)
        .map(|i| format!("local v{} = {} + {}\n", i, i, i * 2))
        .collect()
}

// Parsing is measured separately so the lowering cost stands on its own
fn bench_lowering(c: &mut Criterion) {
    let mut group = c.benchmark_group("lowering");

    for (name, source) in [("closures", CLOSURES), ("tables", TABLES)] {
        let chunk = parse(source).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(compile(&chunk, CompileOptions::default()).unwrap()));
        });
    }

    for count in [10, 100, 200] {
        let chunk = parse(&generated_locals(count)).unwrap();
        group.bench_with_input(BenchmarkId::new("locals", count), &chunk, |b, chunk| {
            b.iter(|| black_box(compile(chunk, CompileOptions::default()).unwrap()));
        });
    }

    group.finish();
}

fn bench_parse_and_lower(c: &mut Criterion) {
    c.bench_function("parse_and_lower_tables", |b| {
        b.iter(|| {
            let chunk = parse(black_box(TABLES)).unwrap();
            black_box(compile(&chunk, CompileOptions::default()).unwrap())
        });
    });
}

criterion_group!(benches, bench_lowering, bench_parse_and_lower);
criterion_main!(benches);
