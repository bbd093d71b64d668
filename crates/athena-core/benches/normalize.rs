use criterion::{black_box, criterion_group, criterion_main, Criterion};

use athena_core::markdown::format_bot_response;
use athena_core::normalize::render_question_text;

fn bench_question_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("question_text");

    let plain = "Which of the following is the unit of electrical resistance?";

    let math = r#"If <span class="mathjax">V = IR</span> and <span class="mathjax">I = 2A</span>, find R given \[
P = I^2 R
\] and P = 40 W."#;

    let images = "Refer to the figure (image)q12_within_1(image) and \
                  (image)q12_within_2(image).<br/>(image)q12_after_1(image)";

    let large = {
        let mut s = String::new();
        for i in 0..50 {
            s.push_str(&format!(
                "Step {i}: <span class=\"mathjax\">x_{i}</span> see (image)q{i}_within_1(image). "
            ));
        }
        s
    };

    group.bench_function("plain", |b| {
        b.iter(|| render_question_text(black_box(plain), black_box("set-1")))
    });

    group.bench_function("math", |b| {
        b.iter(|| render_question_text(black_box(math), black_box("set-1")))
    });

    group.bench_function("images", |b| {
        b.iter(|| render_question_text(black_box(images), black_box("set-1")))
    });

    group.bench_function("50_segments", |b| {
        b.iter(|| render_question_text(black_box(&large), black_box("set-1")))
    });

    group.finish();
}

fn bench_bot_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("bot_response");

    let response = r#"**Option B** is correct because resistance is measured in ohms[^1^][1].

- Option A: volts measure potential difference
- Option B: ohms measure resistance
- Option C: amperes measure current
- Option D: watts measure power

| Quantity | Unit |
|---|---|
| Resistance | Ohm |
| Current | Ampere |

```python
r = v / i
```

[1]: https://en.wikipedia.org/wiki/Ohm "Ohm - Wikipedia"
"#;

    let table = {
        let mut s = String::from("| n | square |\n|---|---|\n");
        for i in 0..200 {
            s.push_str(&format!("| {i} | {} |\n", i * i));
        }
        s
    };

    group.bench_function("typical", |b| {
        b.iter(|| format_bot_response(black_box(response)))
    });

    group.bench_function("200_row_table", |b| {
        b.iter(|| format_bot_response(black_box(&table)))
    });

    group.finish();
}

criterion_group!(benches, bench_question_text, bench_bot_response);
criterion_main!(benches);
